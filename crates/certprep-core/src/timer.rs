//! Countdown for timed assessments.
//!
//! [`Countdown`] is plain state advanced one second per call to
//! [`Countdown::tick`]. Where the ticks come from is up to a [`TickSource`]:
//! [`IntervalTicks`] drives it from the tokio clock, tests tick by hand.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, Interval};

/// Result of advancing a countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Remaining(u64),
    /// Reached zero on this tick. Reported once.
    Expired,
    /// Already expired or cancelled; nothing happened.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Running,
    Expired,
    Cancelled,
}

/// A one-second-granularity countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    state: CountdownState,
}

impl Countdown {
    /// Start counting down from `duration_secs`.
    pub fn start(duration_secs: u64) -> Self {
        Self {
            remaining: duration_secs,
            state: CountdownState::Running,
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining)
        }
    }

    /// Stop the countdown. Later ticks are [`Tick::Idle`].
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Cancelled;
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining
    }
}

/// Format seconds as `minutes:seconds`, e.g. `4:05`.
pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// A source of one-second ticks.
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick.
    async fn next_tick(&mut self);
}

/// Ticks from a tokio interval. The first tick fires one period after
/// creation, not immediately.
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let interval = tokio::time::interval_at(Instant::now() + period, period);
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }
}
