//! Extraction aggregation
//!
//! Runs an extractor over every gold sentence, drops degenerate triplets
//! and flattens the rest into scorer rows.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::tsv;
use tribench_core::{AnnotationIndex, OutputRow, OutputTable, Result};
use tribench_extractor::TripletExtractor;

/// Where the table goes and how progress is shown
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Write the table here once every sentence is processed
    pub save_path: Option<PathBuf>,
    /// Show a progress bar on stderr
    pub show_progress: bool,
    /// Progress bar message
    pub label: String,
}

impl AggregateOptions {
    pub fn save_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_progress(mut self, label: impl Into<String>) -> Self {
        self.show_progress = true;
        self.label = label.into();
        self
    }
}

fn progress_bar(len: usize, options: &AggregateOptions) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    progress.set_message(options.label.clone());
    progress
}

/// Run `extractor` over `index` and collect the non-degenerate triplets.
///
/// Extractor errors propagate as [`BenchError::Extraction`] and nothing is
/// written; the output file only appears after a complete pass.
///
/// [`BenchError::Extraction`]: tribench_core::BenchError::Extraction
pub fn prepare_benchmark_output(
    extractor: &dyn TripletExtractor,
    index: &AnnotationIndex,
    options: &AggregateOptions,
) -> Result<OutputTable> {
    let progress = progress_bar(index.len(), options);
    let collected = collect_rows(extractor, index, &progress);
    progress.finish_and_clear();
    let table = collected?;

    if let Some(path) = &options.save_path {
        tsv::write_rows(path, &table.rows)?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            "Wrote system output"
        );
    }

    Ok(table)
}

fn collect_rows(
    extractor: &dyn TripletExtractor,
    index: &AnnotationIndex,
    progress: &ProgressBar,
) -> Result<OutputTable> {
    let mut table = OutputTable::default();

    for (sentence_id, text) in index.iter() {
        let triplets = extractor.extract(text)?;

        let mut kept = 0usize;
        let mut dropped = 0usize;
        for triplet in triplets {
            if triplet.is_degenerate() {
                dropped += 1;
                continue;
            }
            table.rows.push(OutputRow::from_triplet(sentence_id, triplet));
            kept += 1;
        }

        table.sentences += 1;
        table.discarded += dropped;
        tracing::debug!(sentence_id, kept, dropped, "Processed sentence");
        progress.inc(1);
    }

    Ok(table)
}
