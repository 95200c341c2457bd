//! Concept identity model
//!
//! Minimal views of the records the identity subsystem reads and appends to.
//! Concepts and sources are owned by the external store; the core only ever
//! appends mappings to a concept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A clinical concept record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// Internal numeric key, unique per deployment
    pub id: i32,

    pub uuid: Uuid,

    /// Mapping entries, in insertion order
    #[serde(default)]
    pub mappings: Vec<ConceptMap>,
}

impl Concept {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            mappings: Vec::new(),
        }
    }

    /// Builder-style helper for attaching an existing mapping
    pub fn with_mapping(mut self, mapping: ConceptMap) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Whether any mapping on this concept points into `source`
    pub fn has_mapping_in(&self, source: &ConceptSource) -> bool {
        self.mappings.iter().any(|m| &m.source == source)
    }

    /// Mappings that point into `source`
    pub fn mappings_in<'a>(
        &'a self,
        source: &'a ConceptSource,
    ) -> impl Iterator<Item = &'a ConceptMap> + 'a {
        self.mappings.iter().filter(move |m| &m.source == source)
    }
}

/// An identifier namespace a concept can be mapped into.
///
/// Identity is the UUID: two values with the same UUID are the same source,
/// even if one of them carries stale display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptSource {
    pub uuid: Uuid,

    /// Human-readable name; also the token used in `name:code` identifiers
    pub name: String,

    pub description: String,

    /// Alternative short code accepted in `code:id` identifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hl7_code: Option<String>,

    pub date_created: DateTime<Utc>,
}

impl ConceptSource {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            hl7_code: None,
            date_created: Utc::now(),
        }
    }

    pub fn with_hl7_code(mut self, code: impl Into<String>) -> Self {
        self.hl7_code = Some(code.into());
        self
    }

    /// Whether `token` names this source in an identifier string
    pub fn matches_token(&self, token: &str) -> bool {
        self.name == token || self.hl7_code.as_deref() == Some(token)
    }
}

impl PartialEq for ConceptSource {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for ConceptSource {}

impl Hash for ConceptSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// A (source, code) term record that mappings can point at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptReferenceTerm {
    pub uuid: Uuid,
    pub source: ConceptSource,
    pub code: String,
}

impl ConceptReferenceTerm {
    pub fn new(source: ConceptSource, code: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source,
            code: code.into(),
        }
    }
}

/// Relationship recorded on reference-term mappings
pub const SAME_AS_MAP_TYPE: &str = "SAME-AS";

/// A mapping entry giving a concept an identity within a source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    pub source: ConceptSource,
    pub code: String,

    /// Set when the mapping was created through a reference term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_term: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
}

impl ConceptMap {
    /// A mapping that carries its code directly
    pub fn direct(source: ConceptSource, code: impl Into<String>) -> Self {
        Self {
            source,
            code: code.into(),
            reference_term: None,
            map_type: None,
        }
    }

    /// A `SAME-AS` mapping pointing at a reference term
    pub fn to_term(term: &ConceptReferenceTerm) -> Self {
        Self {
            source: term.source.clone(),
            code: term.code.clone(),
            reference_term: Some(term.uuid),
            map_type: Some(SAME_AS_MAP_TYPE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_identity_is_uuid() {
        let source = ConceptSource::new("rxnorm", "RxNorm");
        let mut renamed = source.clone();
        renamed.name = "RXNORM".to_string();

        assert_eq!(source, renamed);
        assert_ne!(source, ConceptSource::new("rxnorm", "RxNorm"));
    }

    #[test]
    fn test_matches_token() {
        let source = ConceptSource::new("SNOMED CT", "SNOMED").with_hl7_code("SCT");
        assert!(source.matches_token("SNOMED CT"));
        assert!(source.matches_token("SCT"));
        assert!(!source.matches_token("sct"));
    }

    #[test]
    fn test_has_mapping_in() {
        let local = ConceptSource::new("impl+local", "Local");
        let other = ConceptSource::new("rxnorm", "RxNorm");
        let concept = Concept::new(7).with_mapping(ConceptMap::direct(other.clone(), "7"));

        assert!(concept.has_mapping_in(&other));
        assert!(!concept.has_mapping_in(&local));
        assert_eq!(concept.mappings_in(&other).count(), 1);
    }
}
