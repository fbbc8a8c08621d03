//! Core data model types for certprep.
//!
//! Assessments and their questions are authored content and never change at
//! runtime. An [`Attempt`] records one user's pass through an assessment.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssessmentError;

/// An immutable assessment definition (a quiz or a practice exam).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier for this assessment.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Description shown before the assessment starts.
    #[serde(default)]
    pub description: String,
    /// Time limit in minutes.
    pub time_limit_minutes: u32,
    /// Percentage (0-100) required to pass.
    pub passing_score: u32,
    /// Ordered questions.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Assessment {
    /// Countdown duration for a session of this assessment.
    pub fn time_limit_secs(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }

    /// Sum of all question weights.
    pub fn total_points(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.points)).sum()
    }

    /// Look up a question by ID.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Whether a percentage meets the passing threshold.
    pub fn is_passing(&self, percentage: u32) -> bool {
        percentage >= self.passing_score
    }

    /// Every structural problem that makes this assessment unusable.
    pub fn problems(&self) -> Vec<AssessmentError> {
        let mut problems = Vec::new();

        if self.questions.is_empty() {
            problems.push(AssessmentError::NoQuestions(self.id.clone()));
        }
        if self.time_limit_minutes == 0 {
            problems.push(AssessmentError::ZeroTimeLimit(self.id.clone()));
        }
        if self.passing_score > 100 {
            problems.push(AssessmentError::PassingScoreOutOfRange(self.passing_score));
        }

        let mut seen_ids = HashSet::new();
        for question in &self.questions {
            if !seen_ids.insert(question.id.as_str()) {
                problems.push(AssessmentError::DuplicateQuestion(question.id.clone()));
            }
            if let Err(e) = question.validate() {
                problems.push(e);
            }
        }

        problems
    }

    /// Check that a session can be run against this assessment.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }
}

/// A single question within an assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within the assessment.
    pub id: String,
    /// Single or multi-select.
    pub kind: QuestionKind,
    /// The question text.
    pub prompt: String,
    /// Ordered option labels.
    pub options: Vec<String>,
    /// Labels that make up the correct answer.
    pub correct: BTreeSet<String>,
    /// Shown during review.
    #[serde(default)]
    pub explanation: String,
    /// Point weight.
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topics: Vec<String>,
}

fn default_points() -> u32 {
    1
}

impl Question {
    /// Whether `label` is one of this question's options.
    pub fn has_option(&self, label: &str) -> bool {
        self.options.iter().any(|o| o == label)
    }

    fn validate(&self) -> Result<(), AssessmentError> {
        let invalid = |reason: &str| AssessmentError::InvalidQuestion {
            question_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.points == 0 {
            return Err(invalid("point weight must be positive"));
        }
        if self.options.is_empty() {
            return Err(invalid("no options"));
        }
        if self.correct.is_empty() {
            return Err(invalid("no correct answer"));
        }
        if self.kind == QuestionKind::SingleSelect && self.correct.len() != 1 {
            return Err(invalid(
                "single-select question must have exactly one correct answer",
            ));
        }
        if let Some(label) = self.correct.iter().find(|c| !self.has_option(c)) {
            return Err(AssessmentError::InvalidQuestion {
                question_id: self.id.clone(),
                reason: format!("correct answer '{label}' is not an option"),
            });
        }
        Ok(())
    }
}

/// How many options a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleSelect,
    MultiSelect,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::SingleSelect => write!(f, "single-select"),
            QuestionKind::MultiSelect => write!(f, "multi-select"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single-select" | "single" => Ok(QuestionKind::SingleSelect),
            "multi-select" | "multiple" | "multi" => Ok(QuestionKind::MultiSelect),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// Difficulty tag attached by content authors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" | "beginner" => Ok(Difficulty::Easy),
            "medium" | "intermediate" => Ok(Difficulty::Medium),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A recorded answer: one option label, or a set of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl Answer {
    /// Build a multi-select answer from labels.
    pub fn multiple<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Multiple(labels.into_iter().map(Into::into).collect())
    }

    /// The selected labels, regardless of variant.
    pub fn selections(&self) -> BTreeSet<&str> {
        match self {
            Answer::Single(label) => BTreeSet::from([label.as_str()]),
            Answer::Multiple(labels) => labels.iter().map(String::as_str).collect(),
        }
    }

    /// Whether `label` is selected.
    pub fn contains(&self, label: &str) -> bool {
        match self {
            Answer::Single(l) => l == label,
            Answer::Multiple(labels) => labels.contains(label),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Single(_) => false,
            Answer::Multiple(labels) => labels.is_empty(),
        }
    }

    /// `previous` with `label` added or removed, as a multi-select answer.
    pub fn toggle(previous: Option<&Answer>, label: &str) -> Answer {
        let mut labels: BTreeSet<String> = previous
            .map(|a| a.selections().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        if !labels.remove(label) {
            labels.insert(label.to_string());
        }
        Answer::Multiple(labels)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Single(label) => write!(f, "{label}"),
            Answer::Multiple(labels) => {
                let joined: Vec<&str> = labels.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

/// Why an attempt left the in-progress phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitReason {
    /// The user submitted explicitly.
    Manual,
    /// The countdown reached zero.
    TimedOut,
}

impl fmt::Display for SubmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitReason::Manual => write!(f, "submitted"),
            SubmitReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// One user's pass through an assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub assessment_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    /// Absent while the attempt is in progress.
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Latest answer per question ID. Unanswered questions have no entry.
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
    /// Percentage, set when graded.
    #[serde(default)]
    pub score: Option<u32>,
    /// Set when graded.
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub submission: Option<SubmitReason>,
}

impl Attempt {
    /// Allocate a fresh attempt with a generated ID.
    pub fn begin(
        assessment_id: impl Into<String>,
        user_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            assessment_id: assessment_id.into(),
            user_id: user_id.into(),
            started_at,
            ended_at: None,
            answers: BTreeMap::new(),
            score: None,
            passed: None,
            submission: None,
        }
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Graded attempts have both an end time and a score.
    pub fn is_graded(&self) -> bool {
        self.ended_at.is_some() && self.score.is_some()
    }

    /// Time between start and end, once ended.
    pub fn elapsed(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
