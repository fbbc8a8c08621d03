//! Attempt history statistics.
//!
//! Summaries shown before an assessment starts and by `certprep history`.
//! Only graded attempts contribute to scores.

use serde::{Deserialize, Serialize};

use crate::model::Attempt;

/// Aggregate view over a user's attempts on one assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// All recorded attempts.
    pub attempt_count: usize,
    /// Attempts that carry a score.
    pub graded_count: usize,
    /// Graded attempts that passed.
    pub pass_count: usize,
    /// Highest percentage.
    pub best_score: Option<u32>,
    /// Percentage of the most recently started graded attempt.
    pub latest_score: Option<u32>,
    /// Mean percentage across graded attempts.
    pub average_score: Option<f64>,
}

impl HistorySummary {
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        let mut graded: Vec<&Attempt> = attempts.iter().filter(|a| a.score.is_some()).collect();
        graded.sort_by_key(|a| a.started_at);

        let scores: Vec<u32> = graded.iter().filter_map(|a| a.score).collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64)
        };

        Self {
            attempt_count: attempts.len(),
            graded_count: graded.len(),
            pass_count: graded.iter().filter(|a| a.passed == Some(true)).count(),
            best_score: scores.iter().copied().max(),
            latest_score: scores.last().copied(),
            average_score,
        }
    }

    /// Fraction of graded attempts that passed.
    pub fn pass_rate(&self) -> f64 {
        if self.graded_count == 0 {
            0.0
        } else {
            self.pass_count as f64 / self.graded_count as f64
        }
    }
}
