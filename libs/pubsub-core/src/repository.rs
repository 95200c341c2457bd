//! Concept repository trait
//!
//! The object store that owns concepts, sources and reference terms. Any
//! backend (PostgreSQL, in-memory, HTTP proxy) can implement this trait.

use crate::{
    model::{Concept, ConceptReferenceTerm, ConceptSource},
    Result,
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ConceptRepository: Send + Sync {
    /// Page through concepts ordered ascending by numeric id
    ///
    /// # Arguments
    /// * `offset` - Number of concepts to skip
    /// * `limit` - Maximum number of concepts to return
    async fn list_concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>>;

    /// Look up a concept by its numeric id
    ///
    /// # Returns
    /// * `Ok(None)` - No concept with this id
    async fn get_concept_by_id(&self, id: i32) -> Result<Option<Concept>>;

    /// Look up a concept through a mapping
    ///
    /// `source` matches a concept source by name or HL7 code. An unknown
    /// source is not an error; it yields `Ok(None)`.
    async fn get_concept_by_mapping(&self, source: &str, code: &str) -> Result<Option<Concept>>;

    /// Look up a concept source by UUID
    async fn get_source_by_uuid(&self, uuid: Uuid) -> Result<Option<ConceptSource>>;

    /// Persist a new or updated concept source
    async fn save_source(&self, source: &ConceptSource) -> Result<()>;

    /// Persist a concept, including mappings appended since it was loaded
    async fn save_concept(&self, concept: &Concept) -> Result<()>;

    /// Look up a reference term by source and code
    async fn get_reference_term(
        &self,
        source: &ConceptSource,
        code: &str,
    ) -> Result<Option<ConceptReferenceTerm>>;

    /// Persist a new reference term and return the stored one.
    ///
    /// If a term for the same source and code already exists (for example one
    /// written by a concurrent run), that term is returned instead and `term`
    /// is discarded.
    async fn save_reference_term(&self, term: &ConceptReferenceTerm)
        -> Result<ConceptReferenceTerm>;

    /// Whether this backend stores mappings through reference terms
    fn supports_reference_terms(&self) -> bool;
}
