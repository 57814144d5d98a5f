//! Question bank: the (domain, level) interview question catalog.
//!
//! The catalog is a JSON document shaped as
//! `{ domain: { level: [question, ...] } }`, read on first access and cached
//! for the life of the process. The default document is compiled into the
//! binary, so it loads from any working directory; a file on disk can replace
//! it. A missing or unreadable file is never fatal: the bank logs a warning
//! and serves empty results.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Question record
// ────────────────────────────────────────────────────────────────────────────

/// A single interview question.
///
/// The record is schema-agnostic: every field in the catalog document is kept
/// and serialized back unchanged. Accessors cover the fields the interview
/// flow reads; absent or mistyped fields read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(Map<String, Value>);

impl Question {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Prompt text read to the candidate.
    pub fn prompt(&self) -> Option<&str> {
        self.0.get("question").and_then(Value::as_str)
    }

    pub fn keywords(&self) -> Vec<String> {
        string_list(self.0.get("keywords"))
    }

    pub fn expected_answers(&self) -> Vec<String> {
        string_list(self.0.get("expectedAnswers"))
    }

    /// Route keywords in document order, each mapped to the id of the
    /// question it leads to.
    pub fn route_keywords(&self) -> Vec<(String, i64)> {
        self.0
            .get("routeKeywords")
            .and_then(Value::as_object)
            .map(|routes| {
                routes
                    .iter()
                    .filter_map(|(keyword, target)| Some((keyword.clone(), target.as_i64()?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn default_next_question_id(&self) -> Option<i64> {
        self.0.get("defaultNextQuestionId").and_then(Value::as_i64)
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected catalog shape: {0}")]
    Shape(String),
}

/// Lowercase domain → lowercase level → ordered questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    domains: HashMap<String, HashMap<String, Vec<Question>>>,
}

impl QuestionCatalog {
    /// Builds a catalog from a parsed document.
    ///
    /// Keys are lowercased on ingestion. Keys that collapse to the same
    /// lowercase form are merged; their question lists are concatenated in
    /// document order. Non-object entries inside a level list are skipped.
    pub fn from_document(document: Value) -> Result<Self, CatalogError> {
        let Value::Object(domains) = document else {
            return Err(CatalogError::Shape(
                "top level must be an object of domains".to_string(),
            ));
        };

        let mut catalog = Self::default();

        for (domain_name, levels) in domains {
            let Value::Object(levels) = levels else {
                return Err(CatalogError::Shape(format!(
                    "domain '{domain_name}' must map to an object of levels"
                )));
            };

            let domain_entry = catalog
                .domains
                .entry(domain_name.to_lowercase())
                .or_default();

            for (level_name, questions) in levels {
                let Value::Array(questions) = questions else {
                    return Err(CatalogError::Shape(format!(
                        "level '{domain_name}/{level_name}' must map to a list of questions"
                    )));
                };

                let bucket = domain_entry.entry(level_name.to_lowercase()).or_default();
                for item in questions {
                    match item {
                        Value::Object(fields) => bucket.push(Question(fields)),
                        other => warn!(
                            "Skipping non-object question in {domain_name}/{level_name}: {other}"
                        ),
                    }
                }
            }
        }

        Ok(catalog)
    }

    /// Questions for a (domain, level) pair; empty when either is unknown.
    pub fn get(&self, domain: &str, level: &str) -> &[Question] {
        self.domains
            .get(&domain.to_lowercase())
            .and_then(|levels| levels.get(&level.to_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn domains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.domains.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn levels(&self, domain: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .domains
            .get(&domain.to_lowercase())
            .map(|levels| levels.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Total number of questions across all domains and levels.
    pub fn question_count(&self) -> usize {
        self.domains
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }
}

/// Catalog shipped with the service.
const BUNDLED_CATALOG: &str = include_str!("../../data/interview-questions.json");

/// Where a bank reads its catalog from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Bundled,
    File(PathBuf),
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Bundled => f.write_str("bundled catalog"),
            CatalogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn read_catalog(source: &CatalogSource) -> Result<QuestionCatalog, CatalogError> {
    let document: Value = match source {
        CatalogSource::Bundled => serde_json::from_str(BUNDLED_CATALOG)?,
        CatalogSource::File(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
    };
    QuestionCatalog::from_document(document)
}

fn load_catalog(source: &CatalogSource) -> QuestionCatalog {
    info!("Loading question catalog from {source}");
    match read_catalog(source) {
        Ok(catalog) => {
            info!(
                "Question catalog loaded: {} questions, domains: {:?}",
                catalog.question_count(),
                catalog.domains()
            );
            catalog
        }
        Err(e) => {
            warn!("Question catalog unavailable at {source} ({e}); serving empty question sets");
            QuestionCatalog::default()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// QuestionBank: lazily loaded, shared catalog
// ────────────────────────────────────────────────────────────────────────────

/// Process-wide question source. Held in `AppState` as `Arc<QuestionBank>`.
///
/// The catalog is built at most once, on the first lookup (or on `warm`).
/// Concurrent first callers block until that single load finishes; every
/// later read is a plain shared borrow.
#[derive(Debug)]
pub struct QuestionBank {
    source: CatalogSource,
    catalog: OnceLock<QuestionCatalog>,
    #[cfg(test)]
    loads: std::sync::atomic::AtomicUsize,
}

impl QuestionBank {
    fn with_source(source: CatalogSource) -> Self {
        Self {
            source,
            catalog: OnceLock::new(),
            #[cfg(test)]
            loads: Default::default(),
        }
    }

    /// A bank backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_source(CatalogSource::File(path.into()))
    }

    /// A bank backed by the catalog compiled into the binary.
    pub fn bundled() -> Self {
        Self::with_source(CatalogSource::Bundled)
    }

    /// A bank that is already loaded with `catalog` and never reads its source.
    pub fn from_catalog(catalog: QuestionCatalog) -> Self {
        let bank = Self::bundled();
        let _ = bank.catalog.set(catalog);
        bank
    }

    fn catalog(&self) -> &QuestionCatalog {
        self.catalog.get_or_init(|| {
            #[cfg(test)]
            self.loads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            load_catalog(&self.source)
        })
    }

    /// Forces the one-time load and returns the number of questions available.
    pub fn warm(&self) -> usize {
        self.catalog().question_count()
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// All questions for (domain, level), in catalog order. Case-insensitive.
    pub fn get_questions(&self, domain: &str, level: &str) -> &[Question] {
        self.catalog().get(domain, level)
    }

    /// A random ordering of the (domain, level) questions, truncated to
    /// `min(count, available)`. The cached catalog order is left untouched.
    pub fn get_shuffled_questions(&self, domain: &str, level: &str, count: usize) -> Vec<Question> {
        let mut questions = self.get_questions(domain, level).to_vec();
        if questions.is_empty() {
            return questions;
        }

        questions.shuffle(&mut rand::thread_rng());
        questions.truncate(count);
        questions
    }

    pub fn domains(&self) -> Vec<String> {
        self.catalog().domains()
    }

    pub fn levels(&self, domain: &str) -> Vec<String> {
        self.catalog().levels(domain)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
