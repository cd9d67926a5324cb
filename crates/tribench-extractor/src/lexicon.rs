//! Lexicon-based triplet extraction
//!
//! A rule-based open IE model: a checkpoint holds weighted relation
//! phrases, and each phrase occurrence in a sentence yields a triplet whose
//! subject is the clause text before the phrase and whose object is the
//! clause text after it.
//!
//! Construction only validates the hyperparameters and the presence of the
//! checkpoint file. The checkpoint itself is loaded on first inference, so a
//! checkpoint trained for a different architecture surfaces as an
//! inference-time [`ExtractorError::ArchitectureMismatch`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{ExtractorFactory, ExtractorResult, TripletExtractor};
use tribench_core::{CheckpointSpec, ExtractorError, ModelConfig, Triplet};

/// Registry name of the case-insensitive lexicon model
pub const LEXICON_MODEL: &str = "LexiconTripletExtractor";

/// Registry name of the case-sensitive lexicon model
pub const CASED_LEXICON_MODEL: &str = "CasedLexiconTripletExtractor";

/// Checkpoint file name inside a checkpoint directory
pub const CHECKPOINT_FILE: &str = "model.ckpt";

/// Hyperparameter file name inside a checkpoint directory
pub const HPARAMS_FILE: &str = "hparams.json";

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

// ============================================================================
// Checkpoint formats
// ============================================================================

/// Inference hyperparameters stored next to a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconHyperparameters {
    /// Upper bound on triplets returned per sentence
    pub max_triplets: usize,
    /// Require word boundaries around relation phrases.
    /// Disable for scripts without whitespace (zh, ja).
    pub word_boundaries: bool,
    /// Characters that end a clause when cutting subject/object spans
    pub clause_delimiters: String,
}

impl Default for LexiconHyperparameters {
    fn default() -> Self {
        Self {
            max_triplets: 16,
            word_boundaries: true,
            clause_delimiters: ",;:，；：".to_string(),
        }
    }
}

impl LexiconHyperparameters {
    /// Read and validate a hyperparameter file
    pub fn load(path: &Path) -> ExtractorResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ExtractorError::Hyperparameters {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let hparams: Self =
            serde_json::from_str(&content).map_err(|e| ExtractorError::Hyperparameters {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if hparams.max_triplets == 0 {
            return Err(ExtractorError::Hyperparameters {
                path: path.to_path_buf(),
                message: "max_triplets must be positive".to_string(),
            });
        }

        Ok(hparams)
    }
}

/// A weighted relation phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEntry {
    pub phrase: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

/// Serialized lexicon checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconCheckpoint {
    /// Model the checkpoint was built for
    pub architecture: String,
    pub relations: Vec<RelationEntry>,
}

impl LexiconCheckpoint {
    pub fn new(architecture: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, phrase: impl Into<String>, weight: f32) -> Self {
        self.relations.push(RelationEntry {
            phrase: phrase.into(),
            weight,
        });
        self
    }

    pub fn load(path: &Path) -> ExtractorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExtractorError::Checkpoint {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ExtractorError::Checkpoint {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the checkpoint as pretty-printed JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

// ============================================================================
// Extractor
// ============================================================================

struct CompiledRelation {
    regex: Regex,
    weight: f32,
}

/// Rule-based triplet extractor backed by a relation lexicon
pub struct LexiconTripletExtractor {
    model_name: String,
    case_sensitive: bool,
    most_common: bool,
    checkpoint_path: PathBuf,
    hparams: LexiconHyperparameters,
    relations: OnceCell<Vec<CompiledRelation>>,
}

impl LexiconTripletExtractor {
    /// Build an extractor; the checkpoint is read on first use
    pub fn new(
        model_name: impl Into<String>,
        case_sensitive: bool,
        checkpoint_path: impl Into<PathBuf>,
        hparams_path: &Path,
        most_common: bool,
    ) -> ExtractorResult<Self> {
        let checkpoint_path = checkpoint_path.into();
        let hparams = LexiconHyperparameters::load(hparams_path)?;

        if !checkpoint_path.is_file() {
            return Err(ExtractorError::Checkpoint {
                path: checkpoint_path,
                message: "checkpoint file not found".to_string(),
            });
        }

        Ok(Self {
            model_name: model_name.into(),
            case_sensitive,
            most_common,
            checkpoint_path,
            hparams,
            relations: OnceCell::new(),
        })
    }

    fn relations(&self) -> ExtractorResult<&[CompiledRelation]> {
        self.relations
            .get_or_try_init(|| self.load_relations())
            .map(Vec::as_slice)
    }

    fn load_relations(&self) -> ExtractorResult<Vec<CompiledRelation>> {
        let checkpoint = LexiconCheckpoint::load(&self.checkpoint_path)?;

        if checkpoint.architecture != self.model_name {
            return Err(ExtractorError::ArchitectureMismatch {
                expected: self.model_name.clone(),
                found: checkpoint.architecture,
            });
        }

        let mut entries: Vec<RelationEntry> = checkpoint
            .relations
            .into_iter()
            .filter(|r| !r.phrase.trim().is_empty())
            .collect();
        // Stable: equal weights keep checkpoint order
        entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        let mut compiled = Vec::with_capacity(entries.len());
        for entry in entries {
            let regex = self.compile_phrase(entry.phrase.trim())?;
            compiled.push(CompiledRelation {
                regex,
                weight: entry.weight,
            });
        }

        tracing::debug!(
            model = %self.model_name,
            checkpoint = %self.checkpoint_path.display(),
            relations = compiled.len(),
            "Loaded lexicon checkpoint"
        );

        Ok(compiled)
    }

    fn compile_phrase(&self, phrase: &str) -> ExtractorResult<Regex> {
        let escaped = regex::escape(phrase);
        let pattern = if self.hparams.word_boundaries {
            let starts_word = phrase.chars().next().is_some_and(char::is_alphanumeric);
            let ends_word = phrase.chars().last().is_some_and(char::is_alphanumeric);
            format!(
                "{}{}{}",
                if starts_word { r"\b" } else { "" },
                escaped,
                if ends_word { r"\b" } else { "" }
            )
        } else {
            escaped
        };

        RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| ExtractorError::Checkpoint {
                path: self.checkpoint_path.clone(),
                message: format!("invalid relation phrase '{phrase}': {e}"),
            })
    }

    /// Clause text preceding a match
    fn left_clause<'a>(&self, text: &'a str) -> &'a str {
        let delimiters = self.hparams.clause_delimiters.as_str();
        let start = text
            .rfind(|c| delimiters.contains(c))
            .map(|i| i + text[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        text[start..].trim()
    }

    /// Clause text following a match, without sentence-final punctuation
    fn right_clause<'a>(&self, text: &'a str) -> &'a str {
        let delimiters = self.hparams.clause_delimiters.as_str();
        let end = text.find(|c| delimiters.contains(c)).unwrap_or(text.len());
        text[..end]
            .trim()
            .trim_end_matches(SENTENCE_TERMINATORS)
            .trim_end()
    }
}

impl TripletExtractor for LexiconTripletExtractor {
    fn extract(&self, sentence: &str) -> ExtractorResult<Vec<Triplet>> {
        let relations = self.relations()?;

        // (relation index, triplet)
        let mut found: Vec<(usize, Triplet)> = Vec::new();
        for (idx, relation) in relations.iter().enumerate() {
            for m in relation.regex.find_iter(sentence) {
                let subject = self.left_clause(&sentence[..m.start()]);
                let object = self.right_clause(&sentence[m.end()..]);
                found.push((idx, Triplet::new(subject, m.as_str(), object)));
            }
        }

        if self.most_common && !found.is_empty() {
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for (idx, _) in &found {
                *counts.entry(*idx).or_insert(0) += 1;
            }

            // Relations are sorted by weight, so the lowest index wins ties
            let mut best = (usize::MAX, 0usize);
            for (&idx, &count) in &counts {
                if count > best.1 || (count == best.1 && idx < best.0) {
                    best = (idx, count);
                }
            }
            tracing::trace!(
                relation = best.0,
                weight = relations[best.0].weight,
                occurrences = best.1,
                "Keeping most common relation"
            );
            found.retain(|(idx, _)| *idx == best.0);
        }

        Ok(found
            .into_iter()
            .map(|(_, triplet)| triplet)
            .take(self.hparams.max_triplets)
            .collect())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds [`LexiconTripletExtractor`]s for a registry entry
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconFactory {
    case_sensitive: bool,
}

impl LexiconFactory {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

impl ExtractorFactory for LexiconFactory {
    fn from_config(
        &self,
        config: &ModelConfig,
        model_name: &str,
        version: u32,
        most_common: bool,
    ) -> ExtractorResult<Box<dyn TripletExtractor>> {
        let dir = config.checkpoint_dir(model_name, version);
        let extractor = LexiconTripletExtractor::new(
            model_name,
            self.case_sensitive,
            dir.join(CHECKPOINT_FILE),
            &dir.join(HPARAMS_FILE),
            most_common,
        )?;
        Ok(Box::new(extractor))
    }

    fn from_checkpoint(
        &self,
        spec: &CheckpointSpec,
        most_common: bool,
    ) -> ExtractorResult<Box<dyn TripletExtractor>> {
        let extractor = LexiconTripletExtractor::new(
            spec.model_name.clone(),
            self.case_sensitive,
            spec.checkpoint_path.clone(),
            &spec.hparams_path,
            most_common,
        )?;
        Ok(Box::new(extractor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_model(
        dir: &Path,
        checkpoint: &LexiconCheckpoint,
        hparams: &LexiconHyperparameters,
    ) -> (PathBuf, PathBuf) {
        let ckpt = dir.join(CHECKPOINT_FILE);
        let hp = dir.join(HPARAMS_FILE);
        checkpoint.save(&ckpt).unwrap();
        std::fs::write(&hp, serde_json::to_string(hparams).unwrap()).unwrap();
        (ckpt, hp)
    }

    fn english_lexicon(architecture: &str) -> LexiconCheckpoint {
        LexiconCheckpoint::new(architecture)
            .with_relation("sat on", 2.0)
            .with_relation("is located in", 1.5)
            .with_relation("was born in", 1.0)
    }

    #[test]
    fn test_extract_simple_sentence() {
        let dir = TempDir::new().unwrap();
        let (ckpt, hp) = write_model(
            dir.path(),
            &english_lexicon(LEXICON_MODEL),
            &LexiconHyperparameters::default(),
        );

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let triplets = extractor.extract("The cat sat on the mat.").unwrap();

        assert_eq!(triplets, vec![Triplet::new("The cat", "sat on", "the mat")]);
    }

    #[test]
    fn test_extract_respects_clauses() {
        let dir = TempDir::new().unwrap();
        let (ckpt, hp) = write_model(
            dir.path(),
            &english_lexicon(LEXICON_MODEL),
            &LexiconHyperparameters::default(),
        );

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let triplets = extractor
            .extract("Ada Lovelace was born in London, which is located in England.")
            .unwrap();

        assert!(triplets.contains(&Triplet::new("which", "is located in", "England")));
        assert!(triplets.contains(&Triplet::new("Ada Lovelace", "was born in", "London")));
    }

    #[test]
    fn test_word_boundaries() {
        let dir = TempDir::new().unwrap();
        let checkpoint = LexiconCheckpoint::new(LEXICON_MODEL).with_relation("in", 1.0);
        let (ckpt, hp) = write_model(dir.path(), &checkpoint, &LexiconHyperparameters::default());

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        // "inside" and "Berlin" must not match
        let triplets = extractor.extract("Berlin lies inside Germany").unwrap();
        assert!(triplets.is_empty());
    }

    #[test]
    fn test_without_word_boundaries_for_cjk() {
        let dir = TempDir::new().unwrap();
        let checkpoint = LexiconCheckpoint::new(LEXICON_MODEL).with_relation("位于", 1.0);
        let hparams = LexiconHyperparameters {
            word_boundaries: false,
            ..Default::default()
        };
        let (ckpt, hp) = write_model(dir.path(), &checkpoint, &hparams);

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let triplets = extractor.extract("柏林位于德国。").unwrap();
        assert_eq!(triplets, vec![Triplet::new("柏林", "位于", "德国")]);
    }

    #[test]
    fn test_case_sensitivity() {
        let dir = TempDir::new().unwrap();
        let checkpoint = LexiconCheckpoint::new(CASED_LEXICON_MODEL).with_relation("sat on", 1.0);
        let (ckpt, hp) = write_model(dir.path(), &checkpoint, &LexiconHyperparameters::default());

        let cased =
            LexiconTripletExtractor::new(CASED_LEXICON_MODEL, true, ckpt.clone(), &hp, false)
                .unwrap();
        assert!(cased.extract("The cat SAT ON the mat").unwrap().is_empty());

        let uncased = LexiconTripletExtractor::new(CASED_LEXICON_MODEL, false, ckpt, &hp, false)
            .unwrap();
        let triplets = uncased.extract("The cat SAT ON the mat").unwrap();
        // Relation span keeps the sentence's casing
        assert_eq!(triplets[0].relation, "SAT ON");
    }

    #[test]
    fn test_degenerate_spans_are_returned() {
        let dir = TempDir::new().unwrap();
        let (ckpt, hp) = write_model(
            dir.path(),
            &english_lexicon(LEXICON_MODEL),
            &LexiconHyperparameters::default(),
        );

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let triplets = extractor.extract("The cat sat on.").unwrap();
        assert_eq!(triplets, vec![Triplet::new("The cat", "sat on", "")]);
        assert!(triplets[0].is_degenerate());
    }

    #[test]
    fn test_most_common() {
        let dir = TempDir::new().unwrap();
        let checkpoint = LexiconCheckpoint::new(LEXICON_MODEL)
            .with_relation("likes", 5.0)
            .with_relation("knows", 1.0);
        let (ckpt, hp) = write_model(dir.path(), &checkpoint, &LexiconHyperparameters::default());

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, true).unwrap();
        let triplets = extractor
            .extract("Ann likes Bob; Bob knows Cid; Cid knows Dan")
            .unwrap();

        assert_eq!(triplets.len(), 2);
        assert!(triplets.iter().all(|t| t.relation == "knows"));
    }

    #[test]
    fn test_max_triplets() {
        let dir = TempDir::new().unwrap();
        let checkpoint = LexiconCheckpoint::new(LEXICON_MODEL).with_relation("and", 1.0);
        let hparams = LexiconHyperparameters {
            max_triplets: 2,
            ..Default::default()
        };
        let (ckpt, hp) = write_model(dir.path(), &checkpoint, &hparams);

        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let triplets = extractor.extract("a and b and c and d").unwrap();
        assert_eq!(triplets.len(), 2);
    }

    #[test]
    fn test_architecture_mismatch_is_inference_error() {
        let dir = TempDir::new().unwrap();
        let (ckpt, hp) = write_model(
            dir.path(),
            &english_lexicon(CASED_LEXICON_MODEL),
            &LexiconHyperparameters::default(),
        );

        // Construction succeeds, the mismatch shows up on first use
        let extractor = LexiconTripletExtractor::new(LEXICON_MODEL, false, ckpt, &hp, false).unwrap();
        let err = extractor.extract("The cat sat on the mat.").unwrap_err();
        assert!(matches!(err, ExtractorError::ArchitectureMismatch { .. }));
    }

    #[test]
    fn test_missing_files_fail_construction() {
        let dir = TempDir::new().unwrap();
        let missing_hp = dir.path().join(HPARAMS_FILE);
        let err = LexiconTripletExtractor::new(
            LEXICON_MODEL,
            false,
            dir.path().join(CHECKPOINT_FILE),
            &missing_hp,
            false,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ExtractorError::Hyperparameters { .. }));

        std::fs::write(&missing_hp, "{}").unwrap();
        let err = LexiconTripletExtractor::new(
            LEXICON_MODEL,
            false,
            dir.path().join(CHECKPOINT_FILE),
            &missing_hp,
            false,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ExtractorError::Checkpoint { .. }));
    }

    #[test]
    fn test_invalid_hparams() {
        let dir = TempDir::new().unwrap();
        let hp = dir.path().join(HPARAMS_FILE);
        std::fs::write(&hp, r#"{"max_triplets": 0}"#).unwrap();
        assert!(LexiconHyperparameters::load(&hp).is_err());

        std::fs::write(&hp, "not json").unwrap();
        assert!(LexiconHyperparameters::load(&hp).is_err());
    }

    #[test]
    fn test_factory_from_config_layout() {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig {
            checkpoint_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let model_dir = config.checkpoint_dir(LEXICON_MODEL, 243);
        std::fs::create_dir_all(&model_dir).unwrap();
        write_model(
            &model_dir,
            &english_lexicon(LEXICON_MODEL),
            &LexiconHyperparameters::default(),
        );

        let factory = LexiconFactory::new(false);
        let extractor = factory.from_config(&config, LEXICON_MODEL, 243, false).unwrap();
        assert_eq!(extractor.extract("The cat sat on the mat").unwrap().len(), 1);

        assert!(factory.from_config(&config, LEXICON_MODEL, 263, false).is_err());
    }
}
