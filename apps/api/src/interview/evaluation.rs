//! Answer evaluation: scores an answer 0-100 against a question's keywords
//! and expected answers.
//!
//! Scoring:
//! 1. Keywords carry 40 points, split evenly; each keyword found in the
//!    answer earns its share.
//! 2. Expected answers carry 60 points, split evenly. For each, the answer is
//!    checked for the expected answer's significant words (longer than three
//!    characters); a coverage ratio above 0.3 earns `share × ratio`.
//! 3. The total is rounded and capped at 100.

use serde::{Deserialize, Serialize};

const KEYWORD_POINTS: f64 = 40.0;
const EXPECTED_ANSWER_POINTS: f64 = 60.0;
const MIN_COVERAGE_RATIO: f64 = 0.3;
const MIN_SIGNIFICANT_WORD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub score: u32,
    pub feedback: String,
}

pub fn evaluate_answer<E: AsRef<str>, K: AsRef<str>>(
    answer: &str,
    expected_answers: &[E],
    keywords: &[K],
) -> AnswerEvaluation {
    if answer.trim().is_empty() {
        return AnswerEvaluation {
            score: 0,
            feedback: "No answer provided.".to_string(),
        };
    }

    let answer_lower = answer.to_lowercase();
    let mut total = 0.0_f64;

    let matched_keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.as_ref())
        .filter(|k| answer_lower.contains(&k.to_lowercase()))
        .collect();
    if !keywords.is_empty() {
        total += KEYWORD_POINTS * matched_keywords.len() as f64 / keywords.len() as f64;
    }

    for expected in expected_answers {
        let expected_lower = expected.as_ref().to_lowercase();
        let significant: Vec<&str> = expected_lower
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_LEN)
            .collect();
        if significant.is_empty() {
            continue;
        }

        let covered = significant
            .iter()
            .filter(|w| answer_lower.contains(*w))
            .count();
        let ratio = covered as f64 / significant.len() as f64;
        if ratio > MIN_COVERAGE_RATIO {
            total += EXPECTED_ANSWER_POINTS / expected_answers.len() as f64 * ratio;
        }
    }

    let score = (total.round() as u32).min(100);

    AnswerEvaluation {
        score,
        feedback: build_feedback(score, &matched_keywords),
    }
}

fn build_feedback(score: u32, matched_keywords: &[&str]) -> String {
    let mut feedback = if score >= 80 {
        "Excellent answer! You covered the key points well.".to_string()
    } else if score >= 60 {
        "Good answer! You mentioned some relevant points.".to_string()
    } else if score >= 40 {
        "Your answer is on the right track, but could be more detailed.".to_string()
    } else {
        "Consider reviewing this topic. Your answer missed some key concepts.".to_string()
    };

    if !matched_keywords.is_empty() {
        let mentioned: Vec<&str> = matched_keywords.iter().take(3).copied().collect();
        feedback.push_str(&format!(" You mentioned: {}.", mentioned.join(", ")));
    }

    feedback
}
