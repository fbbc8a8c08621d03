//! Error types for assessments, attempt storage and sessions.
//!
//! Repository errors live in `certprep-core` so the session controller can
//! classify persistence failures without string matching.

use thiserror::Error;
use uuid::Uuid;

/// Structural problems that make an assessment unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessmentError {
    #[error("assessment '{0}' has no questions")]
    NoQuestions(String),

    #[error("assessment '{0}' has a zero time limit")]
    ZeroTimeLimit(String),

    #[error("passing score {0} is above 100")]
    PassingScoreOutOfRange(u32),

    #[error("duplicate question ID: {0}")]
    DuplicateQuestion(String),

    #[error("question '{question_id}': {reason}")]
    InvalidQuestion { question_id: String, reason: String },
}

/// Errors raised by an attempt repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Reading or writing the backing storage failed.
    #[error("attempt storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored attempts could not be encoded or decoded.
    #[error("attempt encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The attempt was already recorded.
    #[error("attempt {0} already recorded")]
    Duplicate(Uuid),

    /// The store cannot be reached right now.
    #[error("attempt store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Returns `true` if a later retry by the repository owner could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Io(_) | RepositoryError::Unavailable(_))
    }
}

/// Errors surfaced by the assessment session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The assessment cannot be started.
    #[error("cannot start assessment: {0}")]
    InvalidAssessment(#[from] AssessmentError),

    /// Prior attempts could not be loaded.
    #[error("failed to load attempt history: {0}")]
    History(#[source] RepositoryError),

    /// Grading succeeded but the attempt could not be stored.
    #[error("attempt {attempt_id} was graded but could not be saved: {source}")]
    Persist {
        attempt_id: Uuid,
        #[source]
        source: RepositoryError,
    },
}
