//! certprep CLI: take timed practice exams from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "certprep", version, about = "Timed certification practice exams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format for `review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an assessment
    Take {
        /// Path to a .toml question bank or directory
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Assessment ID (required when the bank holds several)
        #[arg(long)]
        assessment: Option<String>,

        /// User ID to record the attempt under
        #[arg(long)]
        user: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show prior attempts on an assessment
    History {
        /// Assessment ID
        #[arg(long)]
        assessment: String,

        /// User ID (defaults to the configured user)
        #[arg(long)]
        user: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Review a recorded attempt question by question
    Review {
        /// Path to the question bank the attempt was taken from
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Attempt ID
        #[arg(long, required_unless_present = "from")]
        attempt: Option<uuid::Uuid>,

        /// Render a review previously saved with --out instead of an attempt
        #[arg(long, conflicts_with = "attempt")]
        from: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: ReviewFormat,

        /// Also save the review as JSON to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a question bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("certprep=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            assessment,
            user,
            config,
        } => commands::take::execute(bank, assessment, user, config).await,
        Commands::History {
            assessment,
            user,
            config,
        } => commands::history::execute(assessment, user, config).await,
        Commands::Review {
            bank,
            attempt,
            from,
            format,
            out,
            config,
        } => commands::review::execute(bank, attempt, from, format, out, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
