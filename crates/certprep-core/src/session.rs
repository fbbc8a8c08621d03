//! Assessment session controller.
//!
//! One [`AssessmentSession`] owns the state of a single user working through
//! a single assessment:
//!
//! ```text
//! NotStarted --start--> InProgress --submit / expiry--> Grading --> Completed
//!      ^                     |                                          |
//!      +------- exit --------+                                          |
//!      +------------------------------ retake --------------------------+
//! ```
//!
//! All mutation goes through `&mut self`, so there is exactly one writer.
//! Intents that do not apply in the current phase are ignored and reported
//! as [`Outcome::Ignored`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RepositoryError, SessionError};
use crate::model::{Answer, Assessment, Attempt, Question, QuestionKind, SubmitReason};
use crate::review::AttemptReview;
use crate::scoring::{self, ScoreReport};
use crate::statistics::HistorySummary;
use crate::timer::{Countdown, Tick, TickSource};
use crate::traits::{AttemptRepository, Clock, SystemClock};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    NotStarted,
    InProgress,
    Grading,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Grading => write!(f, "grading"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// Whether an intent changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }

    fn from_bool(applied: bool) -> Self {
        if applied {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }
}

/// User intents a presentation layer can dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Start,
    /// Pick an option: replaces a single-select answer, toggles a
    /// multi-select one.
    Select { question_id: String, label: String },
    /// Overwrite the recorded answer for a question.
    Answer { question_id: String, answer: Answer },
    Navigate(usize),
    Next,
    Previous,
    Submit,
    Exit,
    Retake,
}

/// Receives timer and grading notifications.
pub trait SessionObserver: Send + Sync {
    /// One second elapsed; `remaining_secs` left on the clock.
    fn on_tick(&self, remaining_secs: u64);
    /// The countdown reached zero and the attempt is being submitted.
    fn on_expired(&self, attempt_id: Uuid);
    /// The attempt has ended and is about to be scored and saved. The
    /// session is in [`Phase::Grading`] for the duration.
    fn on_grading(&self, attempt: &Attempt);
    fn on_graded(&self, attempt: &Attempt);
    /// The graded attempt could not be stored.
    fn on_persist_failed(&self, attempt_id: Uuid, error: &RepositoryError);
}

/// No-op session observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_tick(&self, _: u64) {}
    fn on_expired(&self, _: Uuid) {}
    fn on_grading(&self, _: &Attempt) {}
    fn on_graded(&self, _: &Attempt) {}
    fn on_persist_failed(&self, _: Uuid, _: &RepositoryError) {}
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub assessment_id: String,
    pub question_count: usize,
    /// Set while in progress.
    pub current_index: Option<usize>,
    /// Recorded answer per question, in question order.
    pub answers: Vec<AnswerState>,
    pub answered_count: usize,
    /// Set while in progress.
    pub remaining_secs: Option<u64>,
    /// Seconds on the countdown so far, or the recorded duration once ended.
    pub elapsed_secs: Option<i64>,
    /// The in-progress or graded attempt.
    pub attempt: Option<Attempt>,
    /// Set once completed.
    pub review: Option<AttemptReview>,
    pub history: HistorySummary,
}

/// Answer state of one question in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerState {
    pub question_id: String,
    pub answer: Option<Answer>,
}

struct ActiveAttempt {
    attempt: Attempt,
    countdown: Countdown,
    current: usize,
}

struct CompletedAttempt {
    attempt: Attempt,
    score: ScoreReport,
    persisted: bool,
}

enum State {
    NotStarted,
    InProgress(ActiveAttempt),
    Grading(Attempt),
    Completed(CompletedAttempt),
}

/// State machine driving one user through one assessment.
pub struct AssessmentSession {
    assessment: Arc<Assessment>,
    user_id: String,
    repository: Arc<dyn AttemptRepository>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn SessionObserver>,
    history: Vec<Attempt>,
    state: State,
}

impl AssessmentSession {
    /// Open a session in `NotStarted`, loading the user's prior attempts.
    pub async fn open(
        assessment: Arc<Assessment>,
        user_id: impl Into<String>,
        repository: Arc<dyn AttemptRepository>,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into();
        let history = repository
            .list_attempts(&assessment.id, &user_id)
            .await
            .map_err(SessionError::History)?;

        tracing::debug!(
            "opened session for {} on {} ({} prior attempts, store: {})",
            user_id,
            assessment.id,
            history.len(),
            repository.name()
        );

        Ok(Self {
            assessment,
            user_id,
            repository,
            clock: Arc::new(SystemClock),
            observer: Arc::new(NoopObserver),
            history,
            state: State::NotStarted,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        phase_of(&self.state)
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Prior attempts, including ones completed by this session.
    pub fn history(&self) -> &[Attempt] {
        &self.history
    }

    pub fn history_summary(&self) -> HistorySummary {
        HistorySummary::from_attempts(&self.history)
    }

    /// Current question pointer, while in progress.
    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            State::InProgress(active) => Some(active.current),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index()
            .and_then(|i| self.assessment.questions.get(i))
    }

    /// Seconds left on the countdown, while in progress.
    pub fn remaining_secs(&self) -> Option<u64> {
        match &self.state {
            State::InProgress(active) => Some(active.countdown.remaining_secs()),
            _ => None,
        }
    }

    /// The in-progress, grading or completed attempt.
    pub fn attempt(&self) -> Option<&Attempt> {
        match &self.state {
            State::NotStarted => None,
            State::InProgress(active) => Some(&active.attempt),
            State::Grading(attempt) => Some(attempt),
            State::Completed(done) => Some(&done.attempt),
        }
    }

    /// Recorded answer for a question in the current attempt.
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.attempt().and_then(|a| a.answer(question_id))
    }

    /// Score of the completed attempt.
    pub fn score(&self) -> Option<&ScoreReport> {
        match &self.state {
            State::Completed(done) => Some(&done.score),
            _ => None,
        }
    }

    /// Whether the completed attempt reached the repository.
    pub fn is_persisted(&self) -> Option<bool> {
        match &self.state {
            State::Completed(done) => Some(done.persisted),
            _ => None,
        }
    }

    /// Per-question review of the completed attempt.
    pub fn review(&self) -> Option<AttemptReview> {
        match &self.state {
            State::Completed(done) => Some(AttemptReview::from_report(
                &self.assessment,
                &done.attempt,
                &done.score,
            )),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let attempt = self.attempt();
        let answers: Vec<AnswerState> = self
            .assessment
            .questions
            .iter()
            .map(|q| AnswerState {
                question_id: q.id.clone(),
                answer: attempt.and_then(|a| a.answer(&q.id)).cloned(),
            })
            .collect();
        let answered_count = answers
            .iter()
            .filter(|s| s.answer.as_ref().is_some_and(|a| !a.is_empty()))
            .count();
        let elapsed_secs = match &self.state {
            State::InProgress(active) => Some(
                self.assessment
                    .time_limit_secs()
                    .saturating_sub(active.countdown.remaining_secs()) as i64,
            ),
            _ => attempt.and_then(Attempt::elapsed).map(|d| d.num_seconds()),
        };

        SessionSnapshot {
            phase: self.phase(),
            assessment_id: self.assessment.id.clone(),
            question_count: self.assessment.questions.len(),
            current_index: self.current_index(),
            answers,
            answered_count,
            remaining_secs: self.remaining_secs(),
            elapsed_secs,
            attempt: attempt.cloned(),
            review: self.review(),
            history: self.history_summary(),
        }
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Apply an intent.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<Outcome, SessionError> {
        match intent {
            Intent::Start => self.start(),
            Intent::Select { question_id, label } => Ok(self.select(&question_id, &label)),
            Intent::Answer {
                question_id,
                answer,
            } => Ok(self.record_answer(&question_id, answer)),
            Intent::Navigate(index) => Ok(self.navigate(index)),
            Intent::Next => Ok(self.next()),
            Intent::Previous => Ok(self.previous()),
            Intent::Submit => self.submit().await,
            Intent::Exit => Ok(self.exit()),
            Intent::Retake => Ok(self.retake()),
        }
    }

    /// Begin a new attempt and start the countdown.
    ///
    /// Fails if the assessment is malformed. Ignored unless `NotStarted`.
    pub fn start(&mut self) -> Result<Outcome, SessionError> {
        if !matches!(self.state, State::NotStarted) {
            tracing::debug!("start ignored in phase {}", self.phase());
            return Ok(Outcome::Ignored);
        }
        self.assessment.validate()?;

        let attempt = Attempt::begin(&self.assessment.id, &self.user_id, self.clock.now());
        let duration = self.assessment.time_limit_secs();
        tracing::info!(
            "attempt {} started on {} by {} ({}s limit)",
            attempt.id,
            self.assessment.id,
            self.user_id,
            duration
        );

        self.state = State::InProgress(ActiveAttempt {
            attempt,
            countdown: Countdown::start(duration),
            current: 0,
        });
        Ok(Outcome::Applied)
    }

    /// Pick `label` on a question: replaces a single-select answer, toggles
    /// membership for a multi-select one.
    pub fn select(&mut self, question_id: &str, label: &str) -> Outcome {
        let Some(question) = self.assessment.question(question_id) else {
            tracing::debug!("select ignored: unknown question {question_id}");
            return Outcome::Ignored;
        };
        let answer = match question.kind {
            QuestionKind::SingleSelect => Answer::Single(label.to_string()),
            QuestionKind::MultiSelect => Answer::toggle(self.answer(question_id), label),
        };
        self.record_answer(question_id, answer)
    }

    /// Overwrite the answer for a question. Does not move the pointer.
    ///
    /// Ignored outside `InProgress`, for unknown questions, for labels that
    /// are not options, and for a set of labels on a single-select question.
    pub fn record_answer(&mut self, question_id: &str, answer: Answer) -> Outcome {
        let phase = self.phase();
        let State::InProgress(active) = &mut self.state else {
            tracing::debug!("answer ignored in phase {phase}");
            return Outcome::Ignored;
        };
        let Some(question) = self.assessment.question(question_id) else {
            tracing::debug!("answer ignored: unknown question {question_id}");
            return Outcome::Ignored;
        };
        if answer.selections().iter().any(|l| !question.has_option(l)) {
            tracing::debug!("answer ignored: {answer} is not an option of {question_id}");
            return Outcome::Ignored;
        }

        let answer = match (question.kind, answer) {
            (QuestionKind::SingleSelect, Answer::Multiple(labels)) if labels.len() == 1 => {
                labels.into_iter().next().map(Answer::Single)
            }
            (QuestionKind::SingleSelect, Answer::Multiple(labels)) if labels.is_empty() => None,
            (QuestionKind::SingleSelect, Answer::Multiple(_)) => {
                tracing::debug!("answer ignored: several labels for single-select {question_id}");
                return Outcome::Ignored;
            }
            (QuestionKind::MultiSelect, Answer::Single(label)) => {
                Some(Answer::multiple([label]))
            }
            (_, answer) if answer.is_empty() => None,
            (_, answer) => Some(answer),
        };

        match answer {
            Some(answer) => {
                active.attempt.answers.insert(question_id.to_string(), answer);
            }
            None => {
                active.attempt.answers.remove(question_id);
            }
        }
        Outcome::Applied
    }

    /// Move the pointer to `index`. Answers are untouched.
    pub fn navigate(&mut self, index: usize) -> Outcome {
        let count = self.assessment.questions.len();
        let State::InProgress(active) = &mut self.state else {
            return Outcome::Ignored;
        };
        if index >= count {
            tracing::debug!("navigate ignored: index {index} out of {count}");
            return Outcome::Ignored;
        }
        active.current = index;
        Outcome::Applied
    }

    pub fn next(&mut self) -> Outcome {
        match self.current_index() {
            Some(i) => self.navigate(i + 1),
            None => Outcome::Ignored,
        }
    }

    pub fn previous(&mut self) -> Outcome {
        match self.current_index() {
            Some(i) if i > 0 => self.navigate(i - 1),
            _ => Outcome::Ignored,
        }
    }

    /// Whether a manual submit would be accepted right now: the pointer is
    /// on the last question and that question has an answer.
    pub fn can_submit(&self) -> bool {
        let State::InProgress(active) = &self.state else {
            return false;
        };
        if active.current + 1 != self.assessment.questions.len() {
            return false;
        }
        self.assessment
            .questions
            .get(active.current)
            .and_then(|q| active.attempt.answer(&q.id))
            .is_some_and(|a| !a.is_empty())
    }

    /// Submit manually from the answered last question.
    ///
    /// On a storage failure the session is still `Completed` with a graded
    /// attempt and [`SessionError::Persist`] is returned.
    pub async fn submit(&mut self) -> Result<Outcome, SessionError> {
        if !self.can_submit() {
            tracing::debug!("submit ignored in phase {}", self.phase());
            return Ok(Outcome::Ignored);
        }
        self.finish(SubmitReason::Manual).await
    }

    /// Advance the countdown by one second, submitting when it expires.
    pub async fn tick(&mut self) -> Result<Outcome, SessionError> {
        let State::InProgress(active) = &mut self.state else {
            return Ok(Outcome::Ignored);
        };
        match active.countdown.tick() {
            Tick::Remaining(remaining) => {
                self.observer.on_tick(remaining);
                Ok(Outcome::Applied)
            }
            Tick::Expired => {
                let attempt_id = active.attempt.id;
                tracing::info!("attempt {attempt_id} timed out");
                self.observer.on_tick(0);
                self.observer.on_expired(attempt_id);
                self.finish(SubmitReason::TimedOut).await
            }
            Tick::Idle => Ok(Outcome::Ignored),
        }
    }

    /// Tick from `ticks` until the session leaves `InProgress`.
    pub async fn run_until_finished(
        &mut self,
        ticks: &mut dyn TickSource,
    ) -> Result<(), SessionError> {
        while self.phase() == Phase::InProgress {
            ticks.next_tick().await;
            self.tick().await?;
        }
        Ok(())
    }

    /// Abandon the in-progress attempt without recording it.
    pub fn exit(&mut self) -> Outcome {
        if !matches!(self.state, State::InProgress(_)) {
            tracing::debug!("exit ignored in phase {}", self.phase());
            return Outcome::Ignored;
        }
        if let State::InProgress(mut active) =
            std::mem::replace(&mut self.state, State::NotStarted)
        {
            active.countdown.cancel();
            tracing::info!("attempt {} abandoned", active.attempt.id);
        }
        Outcome::Applied
    }

    /// Leave a completed session and return to `NotStarted` for a new attempt.
    pub fn retake(&mut self) -> Outcome {
        let State::Completed(done) = &self.state else {
            tracing::debug!("retake ignored in phase {}", self.phase());
            return Outcome::Ignored;
        };
        tracing::info!("retaking {} after attempt {}", self.assessment.id, done.attempt.id);
        self.state = State::NotStarted;
        Outcome::Applied
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// InProgress -> Grading -> Completed.
    async fn finish(&mut self, reason: SubmitReason) -> Result<Outcome, SessionError> {
        let mut active = match std::mem::replace(&mut self.state, State::NotStarted) {
            State::InProgress(active) => active,
            other => {
                self.state = other;
                return Ok(Outcome::Ignored);
            }
        };
        active.countdown.cancel();

        let mut attempt = active.attempt;
        attempt.ended_at = Some(self.clock.now());
        attempt.submission = Some(reason);
        tracing::info!("attempt {} {reason}, grading", attempt.id);

        self.state = State::Grading(attempt);
        let (score, saved) = {
            let State::Grading(attempt) = &mut self.state else {
                return Ok(Outcome::Ignored);
            };
            self.observer.on_grading(attempt);

            let score = scoring::score(&self.assessment.questions, &attempt.answers);
            attempt.score = Some(score.percentage);
            attempt.passed = Some(self.assessment.is_passing(score.percentage));
            tracing::info!(
                "attempt {} graded: {}% ({})",
                attempt.id,
                score.percentage,
                if attempt.passed == Some(true) {
                    "passed"
                } else {
                    "not passed"
                }
            );

            let saved = self.repository.save(attempt).await;
            self.observer.on_graded(attempt);
            (score, saved)
        };

        let State::Grading(attempt) = std::mem::replace(&mut self.state, State::NotStarted) else {
            return Ok(Outcome::Ignored);
        };
        let persisted = saved.is_ok();
        if persisted {
            self.history.push(attempt.clone());
        }
        let attempt_id = attempt.id;
        self.state = State::Completed(CompletedAttempt {
            attempt,
            score,
            persisted,
        });

        match saved {
            Ok(()) => Ok(Outcome::Applied),
            Err(source) => {
                tracing::warn!("failed to save attempt {attempt_id}: {source}");
                self.observer.on_persist_failed(attempt_id, &source);
                Err(SessionError::Persist { attempt_id, source })
            }
        }
    }
}

impl Drop for AssessmentSession {
    fn drop(&mut self) {
        if let State::InProgress(active) = &mut self.state {
            active.countdown.cancel();
            tracing::debug!("attempt {} discarded on teardown", active.attempt.id);
        }
    }
}

fn phase_of(state: &State) -> Phase {
    match state {
        State::NotStarted => Phase::NotStarted,
        State::InProgress(_) => Phase::InProgress,
        State::Grading(_) => Phase::Grading,
        State::Completed(_) => Phase::Completed,
    }
}
