use std::collections::{BTreeMap, BTreeSet};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use certprep_core::model::{Answer, Difficulty, Question, QuestionKind};
use certprep_core::scoring::score;
use certprep_core::statistics::HistorySummary;

const LABELS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn make_question(i: usize) -> Question {
    let multi = i % 3 == 0;
    let correct: BTreeSet<String> = if multi {
        ["A", "C", "E"].iter().map(|s| s.to_string()).collect()
    } else {
        [LABELS[i % LABELS.len()].to_string()].into()
    };
    Question {
        id: format!("q{i}"),
        kind: if multi {
            QuestionKind::MultiSelect
        } else {
            QuestionKind::SingleSelect
        },
        prompt: format!("Question {i}"),
        options: LABELS.iter().map(|s| s.to_string()).collect(),
        correct,
        explanation: String::new(),
        points: (i % 5 + 1) as u32,
        difficulty: Difficulty::Medium,
        topics: vec![],
    }
}

fn make_answers(questions: &[Question]) -> BTreeMap<String, Answer> {
    questions
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 7 != 0)
        .map(|(i, q)| {
            let answer = match q.kind {
                QuestionKind::MultiSelect => Answer::multiple(["A", "B"]),
                QuestionKind::SingleSelect => Answer::Single(LABELS[i % 4].to_string()),
            };
            (q.id.clone(), answer)
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    for size in [10, 65, 500] {
        let questions: Vec<Question> = (0..size).map(make_question).collect();
        let answers = make_answers(&questions);
        group.bench_function(format!("questions={size}"), |b| {
            b.iter(|| score(black_box(&questions), black_box(&answers)))
        });
    }

    group.finish();
}

fn bench_history_summary(c: &mut Criterion) {
    let attempts: Vec<_> = (0..1000)
        .map(|i| {
            let mut attempt = certprep_core::model::Attempt::begin("bench", "user", chrono::Utc::now());
            attempt.score = Some(i % 101);
            attempt.passed = Some(i % 101 >= 70);
            attempt
        })
        .collect();

    c.bench_function("history_summary_1000", |b| {
        b.iter(|| HistorySummary::from_attempts(black_box(&attempts)))
    });
}

criterion_group!(benches, bench_score, bench_history_summary);
criterion_main!(benches);
