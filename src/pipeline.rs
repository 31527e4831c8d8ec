//! The extract → classify → link pipeline.

use crate::{
    domain::{KeywordClassifier, RelationshipLinker, Requirement},
    storage::{ExtractError, Extractor},
};

/// Turns raw records into enriched, linked requirements.
#[derive(Debug, Clone)]
pub struct Generator {
    classifier: KeywordClassifier,
    linker: RelationshipLinker,
}

impl Generator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(classifier: KeywordClassifier, linker: RelationshipLinker) -> Self {
        Self { classifier, linker }
    }

    /// Extracts every record, classifies each in source order, then links
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the extractor fails.
    #[tracing::instrument(skip_all)]
    pub fn generate(&self, extractor: &dyn Extractor) -> Result<Vec<Requirement>, ExtractError> {
        let raw = extractor.extract()?;
        tracing::info!(count = raw.len(), "extracted requirements");

        let mut requirements: Vec<Requirement> = raw
            .into_iter()
            .map(|record| self.classifier.enrich(record))
            .collect();

        let summary = self.linker.link(&mut requirements);
        tracing::info!(
            linked = summary.linked,
            missing = summary.missing.len(),
            "linked requirements"
        );
        Ok(requirements)
    }
}
