//! tribench Extractor - Triplet extraction models
//!
//! Defines the seam between the benchmark pipeline and the models it
//! evaluates: a constructed [`TripletExtractor`] turns one sentence into
//! (subject, relation, object) triplets, and an [`ExtractorFactory`] builds
//! extractors either from the model configuration or from explicit
//! checkpoint files. Available models are declared in a [`ModelRegistry`].

use tribench_core::{CheckpointSpec, ExtractorError, ModelConfig, Triplet};

pub mod lexicon;
pub mod registry;

pub use lexicon::{
    LexiconCheckpoint, LexiconFactory, LexiconHyperparameters, LexiconTripletExtractor,
    CASED_LEXICON_MODEL, LEXICON_MODEL,
};
pub use registry::{Capability, ModelRegistry, RegistryEntry};

/// Result type for extractor operations
pub type ExtractorResult<T> = std::result::Result<T, ExtractorError>;

/// Trait for triplet extractors
pub trait TripletExtractor: Send + Sync {
    fn extract(&self, sentence: &str) -> ExtractorResult<Vec<Triplet>>;
}

impl<F> TripletExtractor for F
where
    F: Fn(&str) -> ExtractorResult<Vec<Triplet>> + Send + Sync,
{
    fn extract(&self, sentence: &str) -> ExtractorResult<Vec<Triplet>> {
        self(sentence)
    }
}

/// Builds extractors for one registered model
pub trait ExtractorFactory: Send + Sync {
    /// Build from the model configuration, resolving the checkpoint of
    /// `version` inside the configured checkpoint tree
    fn from_config(
        &self,
        config: &ModelConfig,
        model_name: &str,
        version: u32,
        most_common: bool,
    ) -> ExtractorResult<Box<dyn TripletExtractor>>;

    /// Build from explicit model name and checkpoint files
    fn from_checkpoint(
        &self,
        spec: &CheckpointSpec,
        most_common: bool,
    ) -> ExtractorResult<Box<dyn TripletExtractor>>;
}
