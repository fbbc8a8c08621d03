//! The `certprep history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use certprep_core::statistics::HistorySummary;
use certprep_core::timer::format_remaining;
use certprep_store::{load_config_from, open_repository};

pub async fn execute(
    assessment_id: String,
    user: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let user = user.unwrap_or_else(|| config.user.clone());
    let repository = open_repository(&config);

    let attempts = repository
        .list_attempts(&assessment_id, &user)
        .await
        .with_context(|| format!("failed to load history for '{assessment_id}'"))?;

    if attempts.is_empty() {
        println!("No attempts recorded for {assessment_id} by {user}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Started", "Time", "Score", "Result", "Ended by", "Attempt",
    ]);
    for (i, attempt) in attempts.iter().enumerate() {
        let time = attempt
            .elapsed()
            .map(|d| format_remaining(d.num_seconds().max(0) as u64))
            .unwrap_or_else(|| "-".to_string());
        let score = attempt
            .score
            .map(|s| format!("{s}%"))
            .unwrap_or_else(|| "-".to_string());
        let result = match attempt.passed {
            Some(true) => "passed",
            Some(false) => "not passed",
            None => "-",
        };
        let ended_by = attempt
            .submission
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(attempt.started_at.format("%Y-%m-%d %H:%M")),
            Cell::new(time),
            Cell::new(score),
            Cell::new(result),
            Cell::new(ended_by),
            Cell::new(attempt.id),
        ]);
    }

    println!("History for {assessment_id} ({user})");
    println!("{table}");

    let summary = HistorySummary::from_attempts(&attempts);
    println!(
        "\n{} attempts, {} passed ({:.0}%), best {}, average {}",
        summary.graded_count,
        summary.pass_count,
        summary.pass_rate() * 100.0,
        summary
            .best_score
            .map(|s| format!("{s}%"))
            .unwrap_or_else(|| "-".to_string()),
        summary
            .average_score
            .map(|s| format!("{s:.1}%"))
            .unwrap_or_else(|| "-".to_string()),
    );

    Ok(())
}
