//! Collaborator traits for attempt storage and time.
//!
//! Repository implementations live in the `certprep-store` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::model::Attempt;

// ---------------------------------------------------------------------------
// Attempt repository trait
// ---------------------------------------------------------------------------

/// Durable home for completed attempts.
///
/// The session controller calls [`save`](AttemptRepository::save) exactly
/// once per graded attempt and never retries. Retrying is the
/// implementation's business.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Append a completed attempt.
    async fn save(&self, attempt: &Attempt) -> Result<(), RepositoryError>;

    /// Attempts by `user_id` on `assessment_id`, oldest first.
    async fn list_attempts(
        &self,
        assessment_id: &str,
        user_id: &str,
    ) -> Result<Vec<Attempt>, RepositoryError>;

    /// Look up a single attempt.
    async fn find_attempt(&self, id: Uuid) -> Result<Option<Attempt>, RepositoryError>;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Wall-clock source for attempt timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
