//! Concept identifiers
//!
//! External systems reference a concept either by its numeric id (`"123"`) or
//! through a mapping (`"rxnorm:4567"`). The source token is anything without
//! a colon; the code must be an integer.

use crate::{model::Concept, repository::ConceptRepository, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConceptIdentifier {
    /// `id`
    Id(i32),
    /// `source:code`; the code is kept as written
    Mapping { source: String, code: String },
}

impl ConceptIdentifier {
    pub fn parse(identifier: &str) -> Result<Self> {
        if identifier.trim().is_empty() {
            return Err(Error::Validation("blank identifier".to_string()));
        }

        let parts: Vec<&str> = identifier.split(':').collect();
        match parts.as_slice() {
            [id] => id.parse::<i32>().map(Self::Id).map_err(|_| {
                Error::Validation(format!(
                    "Identifier '{}' has format 'id'. The id '{}' must be an integer.",
                    identifier, id
                ))
            }),
            [source, code] => {
                if code.parse::<i32>().is_err() {
                    return Err(Error::Validation(format!(
                        "Identifier '{}' has format 'source:code'. The code '{}' must be an integer.",
                        identifier, code
                    )));
                }
                Ok(Self::Mapping {
                    source: source.to_string(),
                    code: code.to_string(),
                })
            }
            _ => Err(Error::Validation(format!(
                "Identifier '{}' must contain only one ':'",
                identifier
            ))),
        }
    }
}

impl FromStr for ConceptIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConceptIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Mapping { source, code } => write!(f, "{}:{}", source, code),
        }
    }
}

/// Resolves identifiers against the concept repository.
///
/// Unknown concepts and unknown sources come back as `Ok(None)`; only
/// malformed identifiers are errors.
#[derive(Clone)]
pub struct IdentifierResolver {
    repo: Arc<dyn ConceptRepository>,
}

impl IdentifierResolver {
    pub fn new(repo: Arc<dyn ConceptRepository>) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Option<Concept>> {
        match ConceptIdentifier::parse(identifier)? {
            ConceptIdentifier::Id(id) => self.resolve_id(id).await,
            ConceptIdentifier::Mapping { source, code } => {
                self.repo.get_concept_by_mapping(&source, &code).await
            }
        }
    }

    pub async fn resolve_id(&self, id: i32) -> Result<Option<Concept>> {
        self.repo.get_concept_by_id(id).await
    }
}
