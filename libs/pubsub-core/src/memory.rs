//! In-memory settings store and concept repository
//!
//! Backs tests and local experiments. State lives behind tokio `RwLock`s, the
//! same way the runtime configuration cache keeps its values.

use crate::{
    model::{Concept, ConceptReferenceTerm, ConceptSource},
    repository::ConceptRepository,
    settings::SettingsStore,
    Result,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed values without counting them as writes
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls since creation
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str, default: &str) -> Result<String> {
        let values = self.values.read().await;
        Ok(values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Records {
    concepts: BTreeMap<i32, Concept>,
    sources: HashMap<Uuid, ConceptSource>,
    terms: Vec<ConceptReferenceTerm>,
}

#[derive(Debug, Default)]
pub struct MemoryConceptRepository {
    records: RwLock<Records>,
    reference_terms: bool,
    page_fetches: AtomicUsize,
    fail_on_save: RwLock<Option<i32>>,
}

impl MemoryConceptRepository {
    /// A repository that stores mappings directly
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository that advertises reference-term support
    pub fn with_reference_terms() -> Self {
        Self {
            reference_terms: true,
            ..Self::default()
        }
    }

    pub async fn insert_concept(&self, concept: Concept) {
        self.records
            .write()
            .await
            .concepts
            .insert(concept.id, concept);
    }

    /// Insert concepts with ids `1..=count` and no mappings
    pub async fn seed_concepts(&self, count: i32) {
        let mut records = self.records.write().await;
        for id in 1..=count {
            records.concepts.insert(id, Concept::new(id));
        }
    }

    pub async fn insert_source(&self, source: ConceptSource) {
        self.records
            .write()
            .await
            .sources
            .insert(source.uuid, source);
    }

    pub async fn concept(&self, id: i32) -> Option<Concept> {
        self.records.read().await.concepts.get(&id).cloned()
    }

    pub async fn sources(&self) -> Vec<ConceptSource> {
        self.records.read().await.sources.values().cloned().collect()
    }

    pub async fn reference_terms(&self) -> Vec<ConceptReferenceTerm> {
        self.records.read().await.terms.clone()
    }

    /// Total mapping entries across all concepts
    pub async fn mapping_count(&self) -> usize {
        self.records
            .read()
            .await
            .concepts
            .values()
            .map(|c| c.mappings.len())
            .sum()
    }

    /// Number of `list_concepts` calls since creation
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    /// Make `save_concept` fail for the given concept id
    pub async fn fail_on_save(&self, concept_id: Option<i32>) {
        *self.fail_on_save.write().await = concept_id;
    }
}

#[async_trait]
impl ConceptRepository for MemoryConceptRepository {
    async fn list_concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        Ok(records
            .concepts
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_concept_by_id(&self, id: i32) -> Result<Option<Concept>> {
        Ok(self.concept(id).await)
    }

    async fn get_concept_by_mapping(&self, source: &str, code: &str) -> Result<Option<Concept>> {
        let records = self.records.read().await;
        let matching: Vec<Uuid> = records
            .sources
            .values()
            .filter(|s| s.matches_token(source))
            .map(|s| s.uuid)
            .collect();

        Ok(records
            .concepts
            .values()
            .find(|concept| {
                concept
                    .mappings
                    .iter()
                    .any(|m| m.code == code && matching.contains(&m.source.uuid))
            })
            .cloned())
    }

    async fn get_source_by_uuid(&self, uuid: Uuid) -> Result<Option<ConceptSource>> {
        Ok(self.records.read().await.sources.get(&uuid).cloned())
    }

    async fn save_source(&self, source: &ConceptSource) -> Result<()> {
        self.insert_source(source.clone()).await;
        Ok(())
    }

    async fn save_concept(&self, concept: &Concept) -> Result<()> {
        if *self.fail_on_save.read().await == Some(concept.id) {
            return Err(anyhow::anyhow!("failed to save concept {}", concept.id).into());
        }
        self.insert_concept(concept.clone()).await;
        Ok(())
    }

    async fn get_reference_term(
        &self,
        source: &ConceptSource,
        code: &str,
    ) -> Result<Option<ConceptReferenceTerm>> {
        let records = self.records.read().await;
        Ok(records
            .terms
            .iter()
            .find(|t| &t.source == source && t.code == code)
            .cloned())
    }

    async fn save_reference_term(
        &self,
        term: &ConceptReferenceTerm,
    ) -> Result<ConceptReferenceTerm> {
        let mut records = self.records.write().await;
        if let Some(stored) = records
            .terms
            .iter()
            .find(|t| t.source == term.source && t.code == term.code)
        {
            return Ok(stored.clone());
        }
        records.terms.push(term.clone());
        Ok(term.clone())
    }

    fn supports_reference_terms(&self) -> bool {
        self.reference_terms
    }
}
