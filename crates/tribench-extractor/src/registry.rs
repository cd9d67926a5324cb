//! Model registry
//!
//! Statically declared set of models the benchmark can build, each tagged
//! with the capabilities it provides. Fallback candidates are selected by
//! capability, in declaration order.

use crate::lexicon::{LexiconFactory, CASED_LEXICON_MODEL, LEXICON_MODEL};
use crate::{ExtractorFactory, ExtractorResult};
use tribench_core::ExtractorError;

/// What a registered model can be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Produces (subject, relation, object) triplets from a sentence
    TripletExtractor,
    /// Produces typed entity spans only
    EntityTagger,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TripletExtractor => "triplet-extractor",
            Self::EntityTagger => "entity-tagger",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named model and the factory that builds it
pub struct RegistryEntry {
    pub name: String,
    pub capabilities: Vec<Capability>,
    factory: Box<dyn ExtractorFactory>,
}

impl RegistryEntry {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn factory(&self) -> &dyn ExtractorFactory {
        self.factory.as_ref()
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of model entries
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: Vec<RegistryEntry>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the models shipped in this crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(
                LEXICON_MODEL,
                [Capability::TripletExtractor],
                LexiconFactory::new(false),
            )
            .register(
                CASED_LEXICON_MODEL,
                [Capability::TripletExtractor],
                LexiconFactory::new(true),
            );
        registry
    }

    /// Declare a model. Re-registering a name replaces the entry in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
        factory: impl ExtractorFactory + 'static,
    ) -> &mut Self {
        let entry = RegistryEntry {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
            factory: Box::new(factory),
        };

        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => {
                tracing::debug!(model = %entry.name, "Replacing registered model");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Factory for a model, or `UnknownModel`
    pub fn factory(&self, name: &str) -> ExtractorResult<&dyn ExtractorFactory> {
        self.get(name)
            .map(RegistryEntry::factory)
            .ok_or_else(|| ExtractorError::UnknownModel(name.to_string()))
    }

    /// All model names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Names of models providing `capability`, in declaration order
    pub fn candidates(&self, capability: Capability) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.has_capability(capability))
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
