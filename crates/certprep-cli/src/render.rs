//! Terminal rendering for sessions and reviews.

use comfy_table::{Cell, Table};

use certprep_core::model::{Answer, QuestionKind};
use certprep_core::review::AttemptReview;
use certprep_core::session::AssessmentSession;
use certprep_core::statistics::HistorySummary;
use certprep_core::timer::format_remaining;

/// Print the current question with its options and selection marks.
pub fn print_question(session: &AssessmentSession) {
    let (Some(index), Some(question)) = (session.current_index(), session.current_question())
    else {
        return;
    };
    let snapshot = session.snapshot();
    let recorded = session.answer(&question.id);

    println!();
    println!(
        "Question {}/{} [{} pts, {}] answered {}/{}, {} left",
        index + 1,
        snapshot.question_count,
        question.points,
        match question.kind {
            QuestionKind::SingleSelect => "choose one",
            QuestionKind::MultiSelect => "choose all that apply",
        },
        snapshot.answered_count,
        snapshot.question_count,
        format_remaining(snapshot.remaining_secs.unwrap_or(0)),
    );
    println!("{}", question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        let mark = if recorded.is_some_and(|a| a.contains(option)) {
            "x"
        } else {
            " "
        };
        println!("  [{mark}] {}. {option}", i + 1);
    }
}

/// One-line history summary shown before an attempt starts.
pub fn history_line(summary: &HistorySummary) -> String {
    if summary.graded_count == 0 {
        return "No previous attempts.".to_string();
    }
    format!(
        "Previous attempts: {} ({} passed), best {}%, latest {}%",
        summary.graded_count,
        summary.pass_count,
        summary.best_score.unwrap_or(0),
        summary.latest_score.unwrap_or(0)
    )
}

fn answer_cell(answer: Option<&Answer>) -> String {
    answer.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Print a review as a results table followed by explanations for misses.
pub fn print_review(review: &AttemptReview) {
    println!();
    println!("{}", review.assessment_title);
    println!(
        "Score: {}% ({}), passing score {}%",
        review.score,
        if review.passed { "PASSED" } else { "NOT PASSED" },
        review.passing_score
    );
    println!(
        "Correct: {}/{} questions, {:.1}/{} points",
        review.correct_count, review.question_count, review.earned_points, review.total_points
    );
    if let Some(secs) = review.elapsed_secs {
        let how = review
            .submission
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        println!("Time: {}{how}", format_remaining(secs.max(0) as u64));
    }
    println!("Attempt: {}", review.attempt_id);

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Correct", "Points"]);
    for item in &review.items {
        let correct: Vec<&str> = item.correct.iter().map(String::as_str).collect();
        table.add_row(vec![
            Cell::new(item.index + 1),
            Cell::new(&item.question_id),
            Cell::new(answer_cell(item.recorded.as_ref())),
            Cell::new(correct.join(", ")),
            Cell::new(format!("{:.1}/{}", item.earned_points, item.max_points)),
        ]);
    }
    println!("\n{table}");

    let explained: Vec<_> = review
        .missed()
        .filter(|item| !item.explanation.is_empty())
        .collect();
    if !explained.is_empty() {
        println!("\nExplanations:");
        for item in explained {
            println!("  Q{}: {}", item.index + 1, item.explanation);
        }
    }
}
