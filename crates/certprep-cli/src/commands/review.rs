//! The `certprep review` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use certprep_core::parser;
use certprep_core::review::AttemptReview;
use certprep_store::{load_config_from, open_repository};

use crate::render;
use crate::ReviewFormat;

pub async fn execute(
    bank: Option<PathBuf>,
    attempt_id: Option<Uuid>,
    from: Option<PathBuf>,
    format: ReviewFormat,
    out: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let review = match (from, attempt_id) {
        (Some(path), _) => AttemptReview::load_json(&path)?,
        (None, None) => anyhow::bail!("either --attempt or --from is required"),
        (None, Some(attempt_id)) => {
            let config = load_config_from(config_path.as_deref())?;
            let repository = open_repository(&config);

            let attempt = repository
                .find_attempt(attempt_id)
                .await
                .context("failed to read attempt store")?
                .with_context(|| format!("attempt {attempt_id} not found"))?;

            let bank = bank.unwrap_or_else(|| config.bank_dir.clone());
            let banks = parser::load_banks(&bank)?;
            let assessment = parser::find_assessment(banks, Some(&attempt.assessment_id))?;
            AttemptReview::build(&assessment, &attempt)
        }
    };

    if let Some(path) = &out {
        review.save_json(path)?;
        tracing::info!("review saved to {}", path.display());
    }

    match format {
        ReviewFormat::Text => render::print_review(&review),
        ReviewFormat::Markdown => print!("{}", review.to_markdown()),
        ReviewFormat::Json => {
            let json = serde_json::to_string_pretty(&review).context("failed to serialize review")?;
            println!("{json}");
        }
    }

    Ok(())
}
