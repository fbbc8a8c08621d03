//! TOML question bank parser.
//!
//! Loads assessments from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Assessment, Difficulty, Question, QuestionKind};

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    assessment: TomlAssessmentHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlAssessmentHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_time_limit")]
    time_limit_minutes: u32,
    #[serde(default = "default_passing_score")]
    passing_score: u32,
}

fn default_time_limit() -> u32 {
    30
}

fn default_passing_score() -> u32 {
    70
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default = "default_kind_str")]
    kind: String,
    prompt: String,
    options: Vec<String>,
    correct: Vec<String>,
    #[serde(default)]
    explanation: String,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

fn default_kind_str() -> String {
    "single-select".to_string()
}

fn default_points() -> u32 {
    1
}

/// Parse a single TOML file into an `Assessment`.
pub fn parse_assessment(path: &Path) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_assessment_str(&content, path)
}

/// Parse a TOML string into an `Assessment` (useful for testing).
pub fn parse_assessment_str(content: &str, source_path: &Path) -> Result<Assessment> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let difficulty: Difficulty = q
                .difficulty
                .map(|d| {
                    d.parse()
                        .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))
                })
                .transpose()?
                .unwrap_or_default();

            Ok(Question {
                id: q.id,
                kind,
                prompt: q.prompt,
                options: q.options,
                correct: q.correct.into_iter().collect(),
                explanation: q.explanation,
                points: q.points,
                difficulty,
                topics: q.topics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Assessment {
        id: parsed.assessment.id,
        title: parsed.assessment.title,
        description: parsed.assessment.description,
        time_limit_minutes: parsed.assessment.time_limit_minutes,
        passing_score: parsed.assessment.passing_score,
        questions,
    })
}

/// Recursively load all `.toml` question banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<Assessment>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_assessment(&path) {
                Ok(assessment) => banks.push(assessment),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    banks.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(banks)
}

/// Load a bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<Assessment>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_assessment(path)?])
    }
}

/// Pick an assessment by ID, or the only one when `id` is `None`.
pub fn find_assessment(banks: Vec<Assessment>, id: Option<&str>) -> Result<Assessment> {
    match id {
        Some(id) => {
            let available: Vec<String> = banks.iter().map(|a| a.id.clone()).collect();
            banks
                .into_iter()
                .find(|a| a.id == id)
                .with_context(|| format!("assessment '{id}' not found. Available: {available:?}"))
        }
        None => {
            anyhow::ensure!(!banks.is_empty(), "no question banks found");
            anyhow::ensure!(
                banks.len() == 1,
                "{} assessments found, choose one with --assessment",
                banks.len()
            );
            let mut banks = banks;
            Ok(banks.remove(0))
        }
    }
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
    /// Whether the assessment cannot be run because of this.
    pub fatal: bool,
}

/// Validate an assessment for structural errors and common authoring issues.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationWarning> {
    let mut warnings: Vec<ValidationWarning> = assessment
        .problems()
        .into_iter()
        .map(|problem| ValidationWarning {
            question_id: match &problem {
                crate::error::AssessmentError::InvalidQuestion { question_id, .. }
                | crate::error::AssessmentError::DuplicateQuestion(question_id) => {
                    Some(question_id.clone())
                }
                _ => None,
            },
            message: problem.to_string(),
            fatal: true,
        })
        .collect();

    let soft = |question: &Question, message: &str| ValidationWarning {
        question_id: Some(question.id.clone()),
        message: message.to_string(),
        fatal: false,
    };

    for question in &assessment.questions {
        if question.prompt.trim().is_empty() {
            warnings.push(soft(question, "prompt is empty"));
        }
        if question.explanation.trim().is_empty() {
            warnings.push(soft(question, "no explanation for review"));
        }
        let mut seen = std::collections::HashSet::new();
        if question.options.iter().any(|o| !seen.insert(o.as_str())) {
            warnings.push(soft(question, "duplicate option labels"));
        }
        if question.topics.is_empty() {
            warnings.push(soft(question, "no topics tagged"));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[assessment]
id = "ccp-practice"
title = "Cloud Practitioner Practice"
description = "Practice exam"
time_limit_minutes = 20
passing_score = 70

[[questions]]
id = "storage-1"
kind = "single-select"
prompt = "Which service provides object storage?"
options = ["EC2", "S3", "RDS"]
correct = ["S3"]
explanation = "S3 is object storage."
points = 10
difficulty = "easy"
topics = ["storage"]

[[questions]]
id = "compute-1"
kind = "multi-select"
prompt = "Which services run code without managing servers?"
options = ["Lambda", "Fargate", "EC2"]
correct = ["Lambda", "Fargate"]
explanation = "Lambda and Fargate are serverless."
points = 20
topics = ["compute"]
"#;

    #[test]
    fn parse_valid_toml() {
        let a = parse_assessment_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(a.id, "ccp-practice");
        assert_eq!(a.time_limit_minutes, 20);
        assert_eq!(a.questions.len(), 2);
        assert_eq!(a.questions[0].kind, QuestionKind::SingleSelect);
        assert_eq!(a.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(a.questions[1].kind, QuestionKind::MultiSelect);
        assert_eq!(a.questions[1].difficulty, Difficulty::Medium);
        assert!(a.questions[1].correct.contains("Fargate"));
        assert!(a.validate().is_ok());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[assessment]
id = "minimal"
title = "Minimal"

[[questions]]
id = "q1"
prompt = "Pick A"
options = ["A", "B"]
correct = ["A"]
"#;
        let a = parse_assessment_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(a.time_limit_minutes, 30);
        assert_eq!(a.passing_score, 70);
        assert_eq!(a.questions[0].kind, QuestionKind::SingleSelect);
        assert_eq!(a.questions[0].points, 1);
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let toml = r#"
[assessment]
id = "bad"
title = "Bad"

[[questions]]
id = "q1"
kind = "essay"
prompt = "Explain"
options = ["A"]
correct = ["A"]
"#;
        let err = parse_assessment_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_assessment_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_structural_and_soft_issues() {
        let toml = r#"
[assessment]
id = "issues"
title = "Issues"
time_limit_minutes = 0

[[questions]]
id = "q1"
prompt = "Pick one"
options = ["A", "A", "B"]
correct = ["C"]
"#;
        let a = parse_assessment_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_assessment(&a);
        assert!(warnings
            .iter()
            .any(|w| w.fatal && w.message.contains("zero time limit")));
        assert!(warnings
            .iter()
            .any(|w| w.fatal && w.message.contains("'C' is not an option")));
        assert!(warnings
            .iter()
            .any(|w| !w.fatal && w.message.contains("duplicate option")));
        assert!(warnings
            .iter()
            .any(|w| !w.fatal && w.message.contains("no explanation")));
    }

    #[test]
    fn validate_clean_bank() {
        let a = parse_assessment_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert!(validate_assessment(&a).is_empty());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("practice.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "ccp-practice");
    }

    #[test]
    fn find_by_id_or_single() {
        let a = parse_assessment_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        let found = find_assessment(vec![a.clone()], None).unwrap();
        assert_eq!(found.id, "ccp-practice");

        let found = find_assessment(vec![a.clone()], Some("ccp-practice")).unwrap();
        assert_eq!(found.title, "Cloud Practitioner Practice");

        let err = find_assessment(vec![a.clone()], Some("missing")).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let err = find_assessment(vec![a.clone(), a], None).unwrap_err();
        assert!(err.to_string().contains("--assessment"));
    }
}
