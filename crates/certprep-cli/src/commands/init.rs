//! The `certprep init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("certprep.toml").exists() {
        println!("certprep.toml already exists, skipping.");
    } else {
        std::fs::write("certprep.toml", SAMPLE_CONFIG)?;
        println!("Created certprep.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit certprep.toml to choose where attempts are stored");
    println!("  2. Run: certprep validate --bank question-banks");
    println!("  3. Run: certprep take --bank question-banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# certprep configuration

# Recorded on every attempt. ${VAR} references are read from the environment.
user = "${USER}"
bank_dir = "./question-banks"

# Transient save failures are retried with exponential backoff.
save_retries = 2
retry_delay_ms = 250

[store]
type = "json"
path = "./certprep-data/attempts.json"
"#;

const EXAMPLE_BANK: &str = r#"[assessment]
id = "example"
title = "Example Practice Exam"
description = "A two-question exam to try certprep"
time_limit_minutes = 5
passing_score = 70

[[questions]]
id = "rust-ownership"
kind = "single-select"
prompt = "Which keyword moves ownership into a closure?"
options = ["ref", "move", "static", "dyn"]
correct = ["move"]
explanation = "`move` closures take ownership of the captured variables."
points = 10
difficulty = "easy"
topics = ["closures"]

[[questions]]
id = "rust-smart-pointers"
kind = "multi-select"
prompt = "Which types provide shared ownership?"
options = ["Box", "Rc", "Arc", "Cell"]
correct = ["Rc", "Arc"]
explanation = "Rc and Arc are reference counted; Box and Cell have a single owner."
points = 20
difficulty = "medium"
topics = ["smart-pointers"]
"#;
