//! Mapping strategies
//!
//! How a local mapping is materialized depends on what the backing store can
//! represent. The strategy is picked once when the service is composed.

use crate::{
    model::{Concept, ConceptMap, ConceptReferenceTerm, ConceptSource},
    repository::ConceptRepository,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingStrategy {
    /// The mapping carries source and code directly
    Direct,
    /// The mapping points at a shared (source, code) reference term, which is
    /// reused if it already exists
    ReferenceTerm,
}

impl MappingStrategy {
    /// Pick the strategy matching the repository's capabilities
    pub fn detect(repo: &dyn ConceptRepository) -> Self {
        if repo.supports_reference_terms() {
            Self::ReferenceTerm
        } else {
            Self::Direct
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ReferenceTerm => "reference-term",
        }
    }

    /// Attach a mapping from `source` to `concept`, coded by the concept id.
    ///
    /// A concept that already has a mapping into `source` is left untouched.
    ///
    /// # Returns
    /// `true` if a mapping was added and the concept saved
    pub async fn attach(
        &self,
        repo: &dyn ConceptRepository,
        concept: &mut Concept,
        source: &ConceptSource,
    ) -> Result<bool> {
        if concept.has_mapping_in(source) {
            tracing::debug!(
                concept_id = concept.id,
                source = %source.name,
                "Concept already mapped, skipping"
            );
            return Ok(false);
        }

        let code = concept.id.to_string();
        let mapping = match self {
            Self::Direct => ConceptMap::direct(source.clone(), code),
            Self::ReferenceTerm => {
                let term = match repo.get_reference_term(source, &code).await? {
                    Some(term) => term,
                    None => {
                        let term = ConceptReferenceTerm::new(source.clone(), code);
                        repo.save_reference_term(&term).await?
                    }
                };
                ConceptMap::to_term(&term)
            }
        };

        concept.mappings.push(mapping);
        repo.save_concept(concept).await?;
        tracing::debug!(
            concept_id = concept.id,
            source = %source.name,
            strategy = %self,
            "Added local mapping"
        );
        Ok(true)
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "reference-term" | "reference_term" => Ok(Self::ReferenceTerm),
            other => Err(Error::Validation(format!(
                "Unknown mapping strategy '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "direct".parse::<MappingStrategy>().unwrap(),
            MappingStrategy::Direct
        );
        assert_eq!(
            " Reference-Term ".parse::<MappingStrategy>().unwrap(),
            MappingStrategy::ReferenceTerm
        );
        assert!("auto".parse::<MappingStrategy>().is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for strategy in [MappingStrategy::Direct, MappingStrategy::ReferenceTerm] {
            assert_eq!(strategy.to_string().parse::<MappingStrategy>().unwrap(), strategy);
        }
    }
}
