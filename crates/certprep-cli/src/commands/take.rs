//! The `certprep take` command.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

use certprep_core::error::{RepositoryError, SessionError};
use certprep_core::model::Attempt;
use certprep_core::parser;
use certprep_core::session::{AssessmentSession, Outcome, Phase, SessionObserver};
use certprep_core::timer::{format_remaining, IntervalTicks, TickSource};
use certprep_store::{load_config_from, open_repository};

use crate::render;

/// Seconds-remaining marks at which the console announces the time.
const ANNOUNCE_AT: [u64; 3] = [60, 30, 10];

/// Console session observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_tick(&self, remaining_secs: u64) {
        if ANNOUNCE_AT.contains(&remaining_secs) {
            println!("  ({} remaining)", format_remaining(remaining_secs));
        }
    }

    fn on_expired(&self, _attempt_id: Uuid) {
        println!("\nTime is up. Submitting your answers.");
    }

    fn on_grading(&self, _attempt: &Attempt) {
        println!("\nGrading...");
    }

    fn on_graded(&self, attempt: &Attempt) {
        tracing::debug!("attempt {} graded at {:?}%", attempt.id, attempt.score);
    }

    fn on_persist_failed(&self, attempt_id: Uuid, error: &RepositoryError) {
        eprintln!("Warning: attempt {attempt_id} could not be saved: {error}");
    }
}

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// 1-based option numbers to pick on the current question.
    Select(Vec<usize>),
    Next,
    Previous,
    /// 1-based question number.
    Goto(usize),
    Time,
    Submit,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let first = words.next()?;
    let command = match first {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "g" | "goto" => Command::Goto(words.next()?.parse().ok()?),
        "t" | "time" => Command::Time,
        "s" | "submit" => Command::Submit,
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        _ => {
            let numbers = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<usize>().ok())
                .collect::<Option<Vec<_>>>()?;
            return Some(Command::Select(numbers));
        }
    };
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

/// Read stdin lines on a dedicated thread so a pending read never holds up
/// runtime shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

const HELP: &str = "Commands: <number>[ <number>...] select option(s), n next, p previous, \
g <n> go to question, t time left, s submit (from the last question), q quit without saving";

pub async fn execute(
    bank: Option<PathBuf>,
    assessment_id: Option<String>,
    user: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = bank.unwrap_or_else(|| config.bank_dir.clone());
    let banks = parser::load_banks(&bank)?;
    let assessment = parser::find_assessment(banks, assessment_id.as_deref())?;
    let user = user.unwrap_or_else(|| config.user.clone());
    let repository = open_repository(&config);

    let mut session = AssessmentSession::open(Arc::new(assessment), user, repository)
        .await?
        .with_observer(Arc::new(ConsoleObserver));

    let info = session.assessment();
    println!("{}", info.title);
    if !info.description.is_empty() {
        println!("{}", info.description);
    }
    println!(
        "{} questions ({} points), {} minutes, passing score {}%",
        info.questions.len(),
        info.total_points(),
        info.time_limit_minutes,
        info.passing_score
    );
    println!("{}", render::history_line(&session.history_summary()));
    println!("{HELP}");

    session.start()?;
    render::print_question(&session);

    let mut input = spawn_input_reader();
    let mut ticks = IntervalTicks::every_second();

    while session.phase() == Phase::InProgress {
        tokio::select! {
            _ = ticks.next_tick() => {
                let result = session.tick().await;
                finish_if_completed(&session, result)?;
            }
            line = input.recv() => {
                let Some(line) = line else {
                    session.exit();
                    println!("Input closed, attempt discarded.");
                    return Ok(());
                };
                let line = line.context("failed to read input")?;
                if !handle_line(&mut session, &line).await? {
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

/// Apply one input line. Returns `false` once the session should end
/// without a result.
async fn handle_line(session: &mut AssessmentSession, line: &str) -> Result<bool> {
    let Some(command) = parse_command(line) else {
        if !line.trim().is_empty() {
            println!("Unrecognized input. {HELP}");
        }
        return Ok(true);
    };

    match command {
        Command::Select(numbers) => {
            let Some(question) = session.current_question().cloned() else {
                return Ok(true);
            };
            for n in numbers {
                let label = n
                    .checked_sub(1)
                    .and_then(|i| question.options.get(i))
                    .cloned();
                match label {
                    Some(label) => {
                        session.select(&question.id, &label);
                    }
                    None => println!("No option {n}."),
                }
            }
            render::print_question(session);
        }
        Command::Next => {
            if session.next() == Outcome::Ignored {
                println!("This is the last question.");
            }
            render::print_question(session);
        }
        Command::Previous => {
            if session.previous() == Outcome::Ignored {
                println!("This is the first question.");
            }
            render::print_question(session);
        }
        Command::Goto(n) => {
            let moved = n.checked_sub(1).map(|i| session.navigate(i));
            if moved != Some(Outcome::Applied) {
                println!("No question {n}.");
            }
            render::print_question(session);
        }
        Command::Time => {
            let left = session.remaining_secs().unwrap_or(0);
            println!("{} remaining", format_remaining(left));
        }
        Command::Submit => {
            let result = session.submit().await;
            if matches!(result, Ok(Outcome::Ignored)) {
                println!("Answer the last question before submitting.");
            }
            finish_if_completed(session, result)?;
        }
        Command::Quit => {
            session.exit();
            println!("Attempt discarded.");
            return Ok(false);
        }
        Command::Help => println!("{HELP}"),
    }
    Ok(true)
}

/// Print the review once the session has completed, then surface any error.
fn finish_if_completed(
    session: &AssessmentSession,
    result: Result<Outcome, SessionError>,
) -> Result<()> {
    if let Some(review) = session.review() {
        render::print_review(&review);
    }
    result?;
    Ok(())
}
