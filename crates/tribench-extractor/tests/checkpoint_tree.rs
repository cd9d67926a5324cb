//! Built-in models loaded from a checkpoint tree on disk

use std::path::Path;

use tempfile::TempDir;
use tribench_core::{ExtractorError, ModelConfig, Triplet};
use tribench_extractor::{
    Capability, LexiconCheckpoint, LexiconHyperparameters, ModelRegistry, CASED_LEXICON_MODEL,
    LEXICON_MODEL,
};

fn write_checkpoint(dir: &Path, checkpoint: &LexiconCheckpoint, hparams: &LexiconHyperparameters) {
    std::fs::create_dir_all(dir).unwrap();
    checkpoint.save(&dir.join("model.ckpt")).unwrap();
    std::fs::write(
        dir.join("hparams.json"),
        serde_json::to_string(hparams).unwrap(),
    )
    .unwrap();
}

fn config(root: &Path) -> ModelConfig {
    ModelConfig {
        checkpoint_root: root.to_path_buf(),
        best_ckpt_path: root.join("best/v{version}/model.ckpt").display().to_string(),
        best_hparams_path: root
            .join("best/v{version}/hparams.json")
            .display()
            .to_string(),
        ..ModelConfig::default()
    }
}

#[test]
fn test_builtin_registry_lists_lexicon_models() {
    let registry = ModelRegistry::builtin();
    assert_eq!(registry.names(), vec![LEXICON_MODEL, CASED_LEXICON_MODEL]);
    assert_eq!(
        registry.candidates(Capability::TripletExtractor),
        vec![LEXICON_MODEL, CASED_LEXICON_MODEL]
    );
    assert!(registry.candidates(Capability::EntityTagger).is_empty());
}

#[test]
fn test_from_config_reads_versioned_directory() {
    let tmp = TempDir::new().unwrap();
    let checkpoint = LexiconCheckpoint::new(LEXICON_MODEL).with_relation("was born in", 1.0);
    write_checkpoint(
        &tmp.path().join(LEXICON_MODEL).join("v243"),
        &checkpoint,
        &LexiconHyperparameters::default(),
    );

    let registry = ModelRegistry::builtin();
    let factory = registry.factory(LEXICON_MODEL).unwrap();
    let extractor = factory
        .from_config(&config(tmp.path()), LEXICON_MODEL, 243, false)
        .unwrap();

    let triplets = extractor
        .extract("Ada Lovelace Was Born In London.")
        .unwrap();
    assert_eq!(
        triplets,
        vec![Triplet::new("Ada Lovelace", "Was Born In", "London")]
    );

    // Another version has no directory
    assert!(factory
        .from_config(&config(tmp.path()), LEXICON_MODEL, 263, false)
        .is_err());
}

#[test]
fn test_from_checkpoint_uses_explicit_paths() {
    let tmp = TempDir::new().unwrap();
    let checkpoint = LexiconCheckpoint::new(CASED_LEXICON_MODEL).with_relation("founded", 1.0);
    write_checkpoint(
        &tmp.path().join("best").join("v263"),
        &checkpoint,
        &LexiconHyperparameters::default(),
    );

    let config = config(tmp.path());
    let spec = config.checkpoint_spec(CASED_LEXICON_MODEL, 263);
    let registry = ModelRegistry::builtin();
    let extractor = registry
        .factory(CASED_LEXICON_MODEL)
        .unwrap()
        .from_checkpoint(&spec, false)
        .unwrap();

    assert_eq!(
        extractor.extract("Jobs founded Apple").unwrap(),
        vec![Triplet::new("Jobs", "founded", "Apple")]
    );
    // Cased model ignores a capitalised phrase
    assert!(extractor.extract("Jobs Founded Apple").unwrap().is_empty());
}

#[test]
fn test_checkpoint_of_other_architecture_fails_at_inference() {
    let tmp = TempDir::new().unwrap();
    let checkpoint = LexiconCheckpoint::new(CASED_LEXICON_MODEL).with_relation("is", 1.0);
    write_checkpoint(
        &tmp.path().join(LEXICON_MODEL).join("v243"),
        &checkpoint,
        &LexiconHyperparameters::default(),
    );

    let registry = ModelRegistry::builtin();
    let extractor = registry
        .factory(LEXICON_MODEL)
        .unwrap()
        .from_config(&config(tmp.path()), LEXICON_MODEL, 243, false)
        .unwrap();

    assert!(matches!(
        extractor.extract("The sky is blue"),
        Err(ExtractorError::ArchitectureMismatch { .. })
    ));
}
