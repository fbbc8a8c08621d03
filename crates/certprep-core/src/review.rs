//! Post-submission review of a graded attempt, with JSON persistence and
//! markdown rendering.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Answer, Assessment, Attempt, QuestionKind, SubmitReason};
use crate::scoring::{self, ScoreReport};
use crate::timer::format_remaining;

/// Everything needed to render the results screen for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReview {
    pub attempt_id: Uuid,
    pub assessment_id: String,
    pub assessment_title: String,
    pub user_id: String,
    /// Percentage score.
    pub score: u32,
    pub passed: bool,
    pub passing_score: u32,
    pub earned_points: f64,
    pub total_points: u64,
    pub correct_count: usize,
    pub question_count: usize,
    /// Seconds between start and submission.
    #[serde(default)]
    pub elapsed_secs: Option<i64>,
    #[serde(default)]
    pub submission: Option<SubmitReason>,
    pub items: Vec<ReviewItem>,
}

/// Review entry for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Zero-based position in the assessment.
    pub index: usize,
    pub question_id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub recorded: Option<Answer>,
    pub correct: BTreeSet<String>,
    pub fully_correct: bool,
    pub earned_points: f64,
    pub max_points: u32,
    pub explanation: String,
}

impl AttemptReview {
    /// Build a review by scoring `attempt` against `assessment`.
    ///
    /// Score and pass flag come from the attempt when it is graded.
    pub fn build(assessment: &Assessment, attempt: &Attempt) -> Self {
        let report = scoring::score(&assessment.questions, &attempt.answers);
        Self::from_report(assessment, attempt, &report)
    }

    pub(crate) fn from_report(
        assessment: &Assessment,
        attempt: &Attempt,
        report: &ScoreReport,
    ) -> Self {
        let items = assessment
            .questions
            .iter()
            .zip(&report.per_question)
            .enumerate()
            .map(|(index, (question, scored))| ReviewItem {
                index,
                question_id: question.id.clone(),
                kind: question.kind,
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                recorded: attempt.answer(&question.id).cloned(),
                correct: question.correct.clone(),
                fully_correct: scored.fully_correct,
                earned_points: scored.earned_points,
                max_points: scored.max_points,
                explanation: question.explanation.clone(),
            })
            .collect();

        let score = attempt.score.unwrap_or(report.percentage);

        Self {
            attempt_id: attempt.id,
            assessment_id: assessment.id.clone(),
            assessment_title: assessment.title.clone(),
            user_id: attempt.user_id.clone(),
            score,
            passed: attempt
                .passed
                .unwrap_or_else(|| assessment.is_passing(score)),
            passing_score: assessment.passing_score,
            earned_points: report.earned_points,
            total_points: report.total_points,
            correct_count: report.correct_count,
            question_count: assessment.questions.len(),
            elapsed_secs: attempt.elapsed().map(|d| d.num_seconds()),
            submission: attempt.submission,
            items,
        }
    }

    /// Questions answered incorrectly or only partially.
    pub fn missed(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter().filter(|item| !item.fully_correct)
    }

    /// Save the review as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize review")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write review to {}", path.display()))?;
        Ok(())
    }

    /// Load a review from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read review from {}", path.display()))?;
        let review: AttemptReview =
            serde_json::from_str(&content).context("failed to parse review JSON")?;
        Ok(review)
    }

    /// Format the review as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.assessment_title));
        md.push_str(&format!(
            "**Score:** {}% ({}), passing score {}%\n\n",
            self.score,
            if self.passed { "passed" } else { "not passed" },
            self.passing_score
        ));
        md.push_str(&format!(
            "**Correct:** {}/{} questions, {:.1}/{} points\n\n",
            self.correct_count, self.question_count, self.earned_points, self.total_points
        ));
        if let Some(secs) = self.elapsed_secs {
            let how = self
                .submission
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            md.push_str(&format!(
                "**Time:** {}{}\n\n",
                format_remaining(secs.max(0) as u64),
                how
            ));
        }

        md.push_str("| # | Question | Your answer | Correct answer | Points |\n");
        md.push_str("|---|----------|-------------|----------------|--------|\n");
        for item in &self.items {
            let recorded = item
                .recorded
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string());
            let correct: Vec<&str> = item.correct.iter().map(String::as_str).collect();
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}/{} |\n",
                item.index + 1,
                item.prompt.replace('|', "\\|"),
                recorded,
                correct.join(", "),
                item.earned_points,
                item.max_points
            ));
        }

        let missed: Vec<&ReviewItem> = self.missed().collect();
        if !missed.is_empty() {
            md.push_str("\n### Explanations\n\n");
            for item in missed {
                if item.explanation.is_empty() {
                    continue;
                }
                md.push_str(&format!("- **Q{}:** {}\n", item.index + 1, item.explanation));
            }
        }

        md
    }
}
