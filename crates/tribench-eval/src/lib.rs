//! tribench Eval - BenchIE-style benchmark runs
//!
//! Reads gold sentences, runs triplet extractors over them and writes the
//! system output consumed by the scorer:
//! - [`annotation`]: gold annotation parsing
//! - [`aggregate`]: per-sentence extraction and filtering
//! - [`tsv`]: system output format
//! - [`orchestrator`]: version × language runs with model fallback
//! - [`report`]: run outcomes

pub mod aggregate;
pub mod annotation;
pub mod orchestrator;
pub mod report;
pub mod tsv;

pub use aggregate::{prepare_benchmark_output, AggregateOptions};
pub use annotation::{load_sentences, parse_sentences, SENT_ID_MARKER};
pub use orchestrator::{AttemptOutcome, Orchestrator, TaskParams};
pub use report::{RunReport, TaskReport, TaskStatus};
