//! The `certprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

use certprep_core::parser;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = parser::load_banks(&bank_path)?;
    anyhow::ensure!(
        !banks.is_empty(),
        "no question banks found in {}",
        bank_path.display()
    );

    let mut total_warnings = 0;
    let mut invalid = 0;

    for assessment in &banks {
        println!(
            "Assessment: {} ({} questions, {} min, pass {}%)",
            assessment.title,
            assessment.questions.len(),
            assessment.time_limit_minutes,
            assessment.passing_score
        );

        let warnings = parser::validate_assessment(assessment);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            let level = if w.fatal { "ERROR" } else { "WARNING" };
            println!("{prefix} {level}: {}", w.message);
        }
        if warnings.iter().any(|w| w.fatal) {
            invalid += 1;
        }
        total_warnings += warnings.len();
    }

    anyhow::ensure!(invalid == 0, "{invalid} assessment(s) cannot be taken");

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
