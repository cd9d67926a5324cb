//! Gold annotation parsing
//!
//! BenchIE gold files interleave sentence lines with their annotated
//! extractions. Only lines carrying the `sent_id:` marker matter here:
//!
//! ```text
//! sent_id:1	The cat sat on the mat.
//! cat --> sat on --> mat
//! ```

use std::path::Path;

use tribench_core::{AnnotationIndex, AnnotationIndexBuilder, BenchError, Result, SentenceRecord};

/// Marker preceding the sentence identifier
pub const SENT_ID_MARKER: &str = "sent_id:";

/// Load the sentences of a gold annotation file, keyed by sentence id
pub fn load_sentences(path: impl AsRef<Path>) -> Result<AnnotationIndex> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
    let index = parse_sentences(&content, path)?;

    tracing::debug!(
        path = %path.display(),
        sentences = index.len(),
        "Loaded gold annotations"
    );
    Ok(index)
}

/// Parse annotation text. `source` is only used in error messages.
pub fn parse_sentences(content: &str, source: &Path) -> Result<AnnotationIndex> {
    let mut builder = AnnotationIndexBuilder::new();

    for (number, raw) in content.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.trim();
        if !line.contains(SENT_ID_MARKER) {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let malformed = |reason: &str| BenchError::MalformedAnnotation {
            path: source.to_path_buf(),
            line: line_no,
            reason: reason.to_string(),
        };

        // The marker never spans a tab, so exactly one field holds it first
        let marker_field = fields
            .iter()
            .position(|f| f.contains(SENT_ID_MARKER))
            .ok_or_else(|| malformed("sentence id marker not found"))?;

        let sentence_id = fields[marker_field]
            .split(SENT_ID_MARKER)
            .nth(1)
            .unwrap_or_default();
        if sentence_id.is_empty() {
            return Err(malformed("empty sentence id"));
        }

        let text = fields
            .get(marker_field + 1)
            .ok_or_else(|| malformed("missing sentence text after sentence id"))?;

        builder
            .insert(SentenceRecord::new(sentence_id, *text))
            .map_err(|duplicate| BenchError::DuplicateSentenceId {
                sentence_id: duplicate.sentence_id,
                path: source.to_path_buf(),
                line: line_no,
            })?;
    }

    Ok(builder.build())
}
