//! Answer classifier: rule-based checks run against a candidate's answer.
//!
//! Three independent predicates, all case-insensitive:
//! - `is_profane`: profanity or abusive phrasing anywhere in the answer.
//! - `is_low_knowledge`: the candidate disclaims knowledge ("i'm not sure").
//! - `is_off_topic`: the answer misses every expected keyword.
//!
//! Matching is naive substring search on purpose: "classic" trips the "ass"
//! entry. Changing that changes which answers the interviewer reacts to.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const PROFANITY_WORDS: &[&str] = &[
    "fuck", "shit", "damn", "hell", "bitch", "ass", "bastard", "crap", "stupid", "idiot", "dumb",
    "moron", "retard", "piss",
];

const ABUSIVE_PHRASES: &[&str] = &[
    "i am angry",
    "you are bad",
    "you are stupid",
    "you are dumb",
    "you are wrong",
    "this is bad",
    "this is stupid",
    "this is dumb",
    "i hate",
    "i am frustrated",
    "this is terrible",
];

const LOW_KNOWLEDGE_PHRASES: &[&str] = &[
    "i don't know",
    "i don't know that",
    "i have no idea",
    "i'm not sure",
    "i'm not familiar",
    "i haven't learned",
    "i don't understand",
    "i can't answer",
];

/// Abusive phrases compiled as whole-string patterns for off-topic detection.
static ABUSIVE_WHOLE_MATCH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ABUSIVE_PHRASES
        .iter()
        .filter_map(|phrase| Regex::new(&format!("^(?:{phrase})$")).ok())
        .collect()
});

/// Outcome of running the checks in interview-flow priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationResult {
    Clean,
    Profane,
    LowKnowledge,
    OffTopic,
}

/// True if the answer contains any profanity word or abusive phrase.
pub fn is_profane(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    PROFANITY_WORDS.iter().any(|w| lower.contains(w))
        || ABUSIVE_PHRASES.iter().any(|p| lower.contains(p))
}

/// True if the answer contains a knowledge disclaimer.
pub fn is_low_knowledge(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    LOW_KNOWLEDGE_PHRASES.iter().any(|p| lower.contains(p))
}

/// True if the answer is judged unrelated to a question with `keywords`.
///
/// Without keywords nothing can be off-topic. An answer that *is* exactly an
/// abusive phrase always is. Otherwise any keyword hit keeps it on-topic, and
/// a keyword-free answer only counts as off-topic when it has at least two
/// words, so short replies like "yes" pass.
pub fn is_off_topic<S: AsRef<str>>(answer: &str, keywords: &[S]) -> bool {
    if keywords.is_empty() {
        return false;
    }

    let lower = answer.to_lowercase();

    // Whole-string match here, unlike the substring check in `is_profane`.
    if ABUSIVE_WHOLE_MATCH.iter().any(|re| re.is_match(&lower)) {
        return true;
    }

    if keywords
        .iter()
        .any(|k| lower.contains(&k.as_ref().to_lowercase()))
    {
        return false;
    }

    answer.split_whitespace().count() >= 2
}

/// Runs the checks as Profane → LowKnowledge → OffTopic and returns the first hit.
pub fn classify<S: AsRef<str>>(answer: &str, keywords: &[S]) -> ClassificationResult {
    if is_profane(answer) {
        ClassificationResult::Profane
    } else if is_low_knowledge(answer) {
        ClassificationResult::LowKnowledge
    } else if is_off_topic(answer, keywords) {
        ClassificationResult::OffTopic
    } else {
        ClassificationResult::Clean
    }
}
