//! Assessment scoring with partial credit for multi-select questions.
//!
//! Scoring is a pure function of the question list and the recorded answers.
//! Per-question credit is kept as an exact fraction so the final percentage
//! is rounded once, half-up, without floating point drift at the pass
//! threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Question, QuestionKind};

/// Outcome of scoring a set of answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Points earned, including fractional partial credit.
    pub earned_points: f64,
    /// Sum of all question weights, answered or not.
    pub total_points: u64,
    /// `earned / total * 100`, rounded half-up. Zero when there are no points.
    pub percentage: u32,
    /// Number of fully correct questions.
    pub correct_count: usize,
    /// Per-question breakdown, in question order.
    pub per_question: Vec<QuestionScore>,
}

impl ScoreReport {
    pub fn is_passing(&self, passing_score: u32) -> bool {
        self.percentage >= passing_score
    }
}

/// Score for a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub earned_points: f64,
    pub max_points: u32,
    pub answered: bool,
    /// The recorded answer matches the correct set exactly.
    pub fully_correct: bool,
}

/// Score `answers` against `questions`.
///
/// Unanswered questions earn nothing. Answers keyed by unknown question IDs
/// are ignored.
pub fn score(questions: &[Question], answers: &BTreeMap<String, Answer>) -> ScoreReport {
    let mut earned = Points::ZERO;
    let mut total_points = 0u64;
    let mut correct_count = 0usize;
    let mut per_question = Vec::with_capacity(questions.len());

    for question in questions {
        let answer = answers.get(&question.id);
        let points = question_points(question, answer);
        let fully_correct = is_fully_correct(question, answer);

        earned = earned.add(points);
        total_points += u64::from(question.points);
        if fully_correct {
            correct_count += 1;
        }

        per_question.push(QuestionScore {
            question_id: question.id.clone(),
            earned_points: points.as_f64(),
            max_points: question.points,
            answered: answer.is_some_and(|a| !a.is_empty()),
            fully_correct,
        });
    }

    ScoreReport {
        earned_points: earned.as_f64(),
        total_points,
        percentage: earned.percentage_of(total_points),
        correct_count,
        per_question,
    }
}

/// Whether `answer` is exactly the correct answer for `question`.
///
/// For multi-select questions the recorded set must equal the correct set;
/// this is independent of the partial credit awarded by [`score`].
pub fn is_fully_correct(question: &Question, answer: Option<&Answer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    let selections = answer.selections();
    selections.len() == question.correct.len()
        && question
            .correct
            .iter()
            .all(|c| selections.contains(c.as_str()))
}

fn question_points(question: &Question, answer: Option<&Answer>) -> Points {
    let Some(answer) = answer else {
        return Points::ZERO;
    };
    let weight = u128::from(question.points);

    match question.kind {
        QuestionKind::SingleSelect => {
            if is_fully_correct(question, Some(answer)) {
                Points::new(weight, 1)
            } else {
                Points::ZERO
            }
        }
        QuestionKind::MultiSelect => {
            let correct_total = question.correct.len() as u128;
            if correct_total == 0 {
                return Points::ZERO;
            }
            let selections = answer.selections();
            let hits = selections
                .iter()
                .filter(|s| question.correct.contains(**s))
                .count() as u128;
            let misses = selections.len() as u128 - hits;
            // (hits - misses) / correct_total, clamped to [0, 1]
            let net = hits.saturating_sub(misses).min(correct_total);
            Points::new(weight * net, correct_total)
        }
    }
}

/// Non-negative rational number of points.
///
/// Widened to `u128` so sums over many `u32` weights cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Points {
    num: u128,
    den: u128,
}

impl Points {
    const ZERO: Points = Points { num: 0, den: 1 };

    fn new(num: u128, den: u128) -> Self {
        let g = gcd(num, den).max(1);
        Points {
            num: num / g,
            den: den / g,
        }
    }

    fn add(self, other: Points) -> Points {
        let g = gcd(self.den, other.den).max(1);
        let den = self.den / g * other.den;
        let num = self.num * (den / self.den) + other.num * (den / other.den);
        Points::new(num, den)
    }

    fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// `round_half_up(self / total * 100)`.
    fn percentage_of(self, total: u64) -> u32 {
        if total == 0 {
            return 0;
        }
        let num = self.num * 100;
        let den = self.den * u128::from(total);
        ((2 * num + den) / (2 * den)) as u32
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    fn question(id: &str, kind: QuestionKind, options: &[&str], correct: &[&str], points: u32) -> Question {
        Question {
            id: id.into(),
            kind,
            prompt: format!("Question {id}"),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct: correct.iter().map(|c| c.to_string()).collect(),
            explanation: String::new(),
            points,
            difficulty: Difficulty::Medium,
            topics: vec![],
        }
    }

    fn multi_abc() -> Question {
        question(
            "m",
            QuestionKind::MultiSelect,
            &["A", "B", "C", "D", "E"],
            &["A", "B", "C"],
            30,
        )
    }

    fn answers(entries: &[(&str, Answer)]) -> BTreeMap<String, Answer> {
        entries
            .iter()
            .map(|(id, a)| (id.to_string(), a.clone()))
            .collect()
    }

    #[test]
    fn single_select_full_credit() {
        let q = question("s", QuestionKind::SingleSelect, &["A", "B"], &["B"], 10);
        let report = score(
            std::slice::from_ref(&q),
            &answers(&[("s", Answer::Single("B".into()))]),
        );
        assert_eq!(report.earned_points, 10.0);
        assert_eq!(report.percentage, 100);
        assert!(report.per_question[0].fully_correct);
        assert!(is_fully_correct(&q, Some(&Answer::Single("B".into()))));
    }

    #[test]
    fn single_select_wrong_answer_earns_nothing() {
        let q = question("s", QuestionKind::SingleSelect, &["A", "B"], &["B"], 10);
        let report = score(&[q], &answers(&[("s", Answer::Single("A".into()))]));
        assert_eq!(report.earned_points, 0.0);
        assert_eq!(report.correct_count, 0);
    }

    #[test]
    fn multi_select_two_of_three() {
        let q = multi_abc();
        let a = Answer::multiple(["A", "B"]);
        let report = score(&[q], &answers(&[("m", a)]));
        assert!((report.earned_points - 20.0).abs() < 1e-9);
        assert!(!report.per_question[0].fully_correct);
    }

    #[test]
    fn multi_select_wrong_selection_cancels_a_right_one() {
        let q = multi_abc();
        let a = Answer::multiple(["A", "B", "D"]);
        let report = score(&[q], &answers(&[("m", a)]));
        assert!((report.earned_points - 10.0).abs() < 1e-9);
    }

    #[test]
    fn multi_select_clamps_at_zero() {
        let q = multi_abc();
        let a = Answer::multiple(["D", "E"]);
        let report = score(&[q], &answers(&[("m", a)]));
        assert_eq!(report.earned_points, 0.0);
    }

    #[test]
    fn multi_select_selecting_everything() {
        // 3 right, 2 wrong: (3 - 2) / 3 of the weight
        let q = multi_abc();
        let a = Answer::multiple(["A", "B", "C", "D", "E"]);
        let report = score(&[q], &answers(&[("m", a)]));
        assert!((report.earned_points - 10.0).abs() < 1e-9);
    }

    #[test]
    fn multi_select_exact_match_is_fully_correct() {
        let q = multi_abc();
        let a = Answer::multiple(["C", "B", "A"]);
        assert!(is_fully_correct(&q, Some(&a)));
        let report = score(&[q], &answers(&[("m", a)]));
        assert_eq!(report.earned_points, 30.0);
        assert_eq!(report.percentage, 100);
    }

    #[test]
    fn empty_selection_earns_zero() {
        let q = multi_abc();
        let report = score(&[q], &answers(&[("m", Answer::multiple(Vec::<String>::new()))]));
        assert_eq!(report.earned_points, 0.0);
        assert!(!report.per_question[0].answered);
    }

    #[test]
    fn unanswered_questions_count_toward_total() {
        let q1 = question("q1", QuestionKind::SingleSelect, &["A", "B"], &["A"], 10);
        let q2 = question("q2", QuestionKind::SingleSelect, &["A", "B"], &["B"], 30);
        let report = score(&[q1, q2], &answers(&[("q1", Answer::Single("A".into()))]));
        assert_eq!(report.total_points, 40);
        assert_eq!(report.percentage, 25);
        assert!(!report.per_question[1].answered);
    }

    #[test]
    fn no_answers_scores_zero() {
        let report = score(&[multi_abc()], &BTreeMap::new());
        assert_eq!(report.percentage, 0);
        assert_eq!(report.correct_count, 0);
    }

    #[test]
    fn no_questions_scores_zero() {
        let report = score(&[], &BTreeMap::new());
        assert_eq!(report.total_points, 0);
        assert_eq!(report.percentage, 0);
    }

    #[test]
    fn two_question_scenario() {
        let q1 = question("q1", QuestionKind::SingleSelect, &["A", "B", "C"], &["B"], 10);
        let q2 = question("q2", QuestionKind::MultiSelect, &["X", "Y", "Z"], &["X", "Y"], 20);
        let report = score(
            &[q1, q2],
            &answers(&[
                ("q1", Answer::Single("B".into())),
                ("q2", Answer::multiple(["X"])),
            ]),
        );
        assert!((report.earned_points - 20.0).abs() < 1e-9);
        assert_eq!(report.total_points, 30);
        assert_eq!(report.percentage, 67);
        assert_eq!(report.correct_count, 1);
        assert!(!report.is_passing(70));
    }

    #[test]
    fn rounding_is_half_up_on_the_final_percentage() {
        // 1 of 8 points = 12.5%
        let q1 = question("q1", QuestionKind::SingleSelect, &["A", "B"], &["A"], 1);
        let q2 = question("q2", QuestionKind::SingleSelect, &["A", "B"], &["A"], 7);
        let report = score(&[q1, q2], &answers(&[("q1", Answer::Single("A".into()))]));
        assert_eq!(report.percentage, 13);
    }

    #[test]
    fn thirds_sum_exactly() {
        // Three questions each earning 1/3 of 10 points: exactly 10 of 30.
        let qs: Vec<Question> = ["a", "b", "c"]
            .iter()
            .map(|id| question(id, QuestionKind::MultiSelect, &["A", "B", "C", "D"], &["A", "B", "C"], 10))
            .collect();
        let recorded = answers(&[
            ("a", Answer::multiple(["A"])),
            ("b", Answer::multiple(["B"])),
            ("c", Answer::multiple(["C"])),
        ]);
        let report = score(&qs, &recorded);
        assert_eq!(report.percentage, 33);
        assert!((report.earned_points - 10.0).abs() < 1e-9);
    }

    #[test]
    fn pass_threshold_boundary() {
        let questions: Vec<Question> = (0..10)
            .map(|i| question(&format!("q{i}"), QuestionKind::SingleSelect, &["A", "B"], &["A"], 1))
            .collect();
        let seventy: BTreeMap<String, Answer> = (0..7)
            .map(|i| (format!("q{i}"), Answer::Single("A".into())))
            .collect();
        let report = score(&questions, &seventy);
        assert_eq!(report.percentage, 70);
        assert!(report.is_passing(70));

        let wide: Vec<Question> = (0..100)
            .map(|i| question(&format!("w{i}"), QuestionKind::SingleSelect, &["A", "B"], &["A"], 1))
            .collect();
        let sixty_nine: BTreeMap<String, Answer> = (0..69)
            .map(|i| (format!("w{i}"), Answer::Single("A".into())))
            .collect();
        let report = score(&wide, &sixty_nine);
        assert_eq!(report.percentage, 69);
        assert!(!report.is_passing(70));
    }

    #[test]
    fn single_select_with_single_element_set_counts() {
        let q = question("s", QuestionKind::SingleSelect, &["A", "B"], &["B"], 5);
        assert!(is_fully_correct(&q, Some(&Answer::multiple(["B"]))));
        assert!(!is_fully_correct(&q, Some(&Answer::multiple(["A", "B"]))));
        assert!(!is_fully_correct(&q, None));
    }

    #[test]
    fn points_arithmetic() {
        let third = Points::new(10, 3);
        let sum = third.add(third).add(third);
        assert_eq!(sum, Points::new(10, 1));
        assert_eq!(Points::new(2, 3).percentage_of(1), 67);
        assert_eq!(Points::new(1, 2).percentage_of(100), 1);
        assert_eq!(gcd(12, 18), 6);
    }

    #[test]
    fn totals_beyond_u32_do_not_overflow() {
        let a = question("a", QuestionKind::SingleSelect, &["A", "B"], &["A"], 3_000_000_000);
        let b = question("b", QuestionKind::SingleSelect, &["A", "B"], &["A"], 3_000_000_000);
        let report = score(&[a, b], &answers(&[("a", Answer::Single("A".into()))]));
        assert_eq!(report.total_points, 6_000_000_000);
        assert_eq!(report.percentage, 50);
        assert_eq!(report.earned_points, 3_000_000_000.0);
    }

    #[test]
    fn heavy_multi_select_weights_sum_exactly() {
        let qs: Vec<Question> = (0..3)
            .map(|i| {
                question(
                    &format!("m{i}"),
                    QuestionKind::MultiSelect,
                    &["A", "B", "C", "D"],
                    &["A", "B", "C"],
                    u32::MAX,
                )
            })
            .collect();
        let recorded: BTreeMap<String, Answer> = (0..3)
            .map(|i| (format!("m{i}"), Answer::multiple(["A", "B"])))
            .collect();
        let report = score(&qs, &recorded);
        assert_eq!(report.total_points, 3 * u64::from(u32::MAX));
        assert_eq!(report.percentage, 67);
    }
}
