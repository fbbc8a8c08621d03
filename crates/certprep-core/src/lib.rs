//! certprep-core: assessment model, scoring engine and session controller.
//!
//! This crate holds everything a timed practice exam needs that does not
//! touch a terminal or a disk format: question banks, the scoring rules,
//! the countdown, and the state machine that ties them together. Attempt
//! storage sits behind [`traits::AttemptRepository`].

pub mod error;
pub mod model;
pub mod parser;
pub mod review;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod timer;
pub mod traits;

pub use error::{AssessmentError, RepositoryError, SessionError};
pub use session::{AssessmentSession, Intent, Outcome, Phase};
