//! tribench Core - Domain models, errors and shared types
//!
//! This crate defines the abstractions shared by the benchmark pipeline:
//! - Gold annotation records and the per-file annotation index
//! - Triplets produced by extractors and the rows written for scoring
//! - Evaluation tasks iterated by the run orchestrator
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, CheckpointSpec, ConfigError, LoggingConfig, ModelConfig, RunConfig, TemplateVars,
};

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while building or running a triplet extractor
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Failed to load hyperparameters from {path}: {message}")]
    Hyperparameters { path: PathBuf, message: String },

    #[error("Failed to load checkpoint {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    #[error("Checkpoint was trained for '{found}' but loaded into '{expected}'")]
    ArchitectureMismatch { expected: String, found: String },

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Core error type for benchmark operations
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate sentence id '{sentence_id}' at {path}:{line}")]
    DuplicateSentenceId {
        sentence_id: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Malformed annotation at {path}:{line}: {reason}")]
    MalformedAnnotation {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Malformed output table at {path}:{line}: {reason}")]
    MalformedTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BenchError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

// ============================================================================
// Gold Annotations
// ============================================================================

/// A gold sentence and its benchmark identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub sentence_id: String,
    pub text: String,
}

impl SentenceRecord {
    pub fn new(sentence_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            text: text.into(),
        }
    }
}

/// Ordered mapping from sentence id to sentence text.
///
/// Built once per annotation file through [`AnnotationIndexBuilder`] and
/// read-only afterwards. Iteration follows insertion (file line) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationIndex {
    records: Vec<SentenceRecord>,
    positions: HashMap<String, usize>,
}

impl AnnotationIndex {
    /// Number of sentences
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the text of a sentence
    pub fn get(&self, sentence_id: &str) -> Option<&str> {
        self.positions
            .get(sentence_id)
            .map(|&i| self.records[i].text.as_str())
    }

    /// Iterate `(sentence_id, text)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records
            .iter()
            .map(|r| (r.sentence_id.as_str(), r.text.as_str()))
    }
}

/// Accumulates records for an [`AnnotationIndex`], refusing duplicate ids
#[derive(Debug, Default)]
pub struct AnnotationIndexBuilder {
    index: AnnotationIndex,
}

impl AnnotationIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. A record whose id is already present is handed back
    /// unchanged and the index is left as it was.
    pub fn insert(
        &mut self,
        record: SentenceRecord,
    ) -> std::result::Result<(), SentenceRecord> {
        if self.index.positions.contains_key(&record.sentence_id) {
            return Err(record);
        }
        self.index
            .positions
            .insert(record.sentence_id.clone(), self.index.records.len());
        self.index.records.push(record);
        Ok(())
    }

    pub fn build(self) -> AnnotationIndex {
        self.index
    }
}

// ============================================================================
// Extractions
// ============================================================================

/// A (subject, relation, object) extraction for one sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triplet {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// True when any span is empty after trimming whitespace.
    /// Such extractions carry no information for the benchmark.
    pub fn is_degenerate(&self) -> bool {
        self.subject.trim().is_empty()
            || self.relation.trim().is_empty()
            || self.object.trim().is_empty()
    }
}

impl<S, R, O> From<(S, R, O)> for Triplet
where
    S: Into<String>,
    R: Into<String>,
    O: Into<String>,
{
    fn from((subject, relation, object): (S, R, O)) -> Self {
        Self::new(subject, relation, object)
    }
}

/// One line of the scorer input: a kept triplet tagged with its sentence id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub sentence_id: String,
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl OutputRow {
    pub fn from_triplet(sentence_id: impl Into<String>, triplet: Triplet) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            subject: triplet.subject,
            relation: triplet.relation,
            object: triplet.object,
        }
    }

    /// Columns in output order
    pub fn fields(&self) -> [&str; 4] {
        [
            self.sentence_id.as_str(),
            self.subject.as_str(),
            self.relation.as_str(),
            self.object.as_str(),
        ]
    }
}

/// Rows produced by one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTable {
    pub rows: Vec<OutputRow>,
    /// Sentences the extractor was run on
    pub sentences: usize,
    /// Triplets dropped by the degenerate-span filter
    pub discarded: usize,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Evaluation Tasks
// ============================================================================

/// A single (checkpoint version, language) unit of a benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTask {
    pub checkpoint_version: u32,
    pub language: String,
    /// Model override for this task; `None` uses the configured model
    pub model_name: Option<String>,
}

impl EvaluationTask {
    pub fn new(checkpoint_version: u32, language: impl Into<String>) -> Self {
        Self {
            checkpoint_version,
            language: language.into(),
            model_name: None,
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }
}

impl std::fmt::Display for EvaluationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}/{}", self.checkpoint_version, self.language)
    }
}
