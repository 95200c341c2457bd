//! Local mapping synchronization
//!
//! Walks every concept in id order and makes sure each one carries a mapping
//! into the local source. There is no checkpointing: an interrupted run is
//! simply started again, and the strategy's dedupe keeps the rerun from
//! adding second mappings.

use crate::{
    local_source::LocalSourceManager, model::Concept, repository::ConceptRepository,
    strategy::MappingStrategy, Error, Result,
};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Outcome of a full synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Pages requested from the repository, including the final short page
    pub pages_fetched: usize,
    pub concepts_visited: usize,
    pub mappings_added: usize,
}

#[derive(Clone)]
pub struct MappingSynchronizer {
    repo: Arc<dyn ConceptRepository>,
    local_sources: LocalSourceManager,
    strategy: MappingStrategy,
    batch_size: usize,
}

impl MappingSynchronizer {
    pub fn new(
        repo: Arc<dyn ConceptRepository>,
        local_sources: LocalSourceManager,
        strategy: MappingStrategy,
    ) -> Self {
        Self {
            repo,
            local_sources,
            strategy,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the page size. Zero is bumped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.strategy
    }

    /// One page of concepts ordered by id
    pub async fn concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>> {
        self.repo.list_concepts(offset, limit).await
    }

    /// Map `concept` into the local source.
    ///
    /// # Returns
    /// `true` if a mapping was added, `false` if the concept already had one
    pub async fn add_local_mapping(&self, concept: &mut Concept) -> Result<bool> {
        let local = self.local_sources.get().await?;
        self.strategy
            .attach(self.repo.as_ref(), concept, &local)
            .await
    }

    pub async fn add_local_mapping_by_id(&self, concept_id: i32) -> Result<bool> {
        let mut concept = self
            .repo
            .get_concept_by_id(concept_id)
            .await?
            .ok_or(Error::ConceptNotFound(concept_id))?;
        self.add_local_mapping(&mut concept).await
    }

    /// Map every concept into the local source, one page at a time.
    ///
    /// Stops after the first page shorter than the batch size. Any failure
    /// aborts the run; mappings saved before it stay in place.
    pub async fn add_local_mappings_to_all(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let mut offset = 0;

        tracing::info!(
            batch_size = self.batch_size,
            strategy = %self.strategy,
            "Starting local mapping synchronization"
        );

        loop {
            let mut concepts = self.concepts(offset, self.batch_size).await?;
            report.pages_fetched += 1;
            let fetched = concepts.len();

            for concept in concepts.iter_mut() {
                if self.add_local_mapping(concept).await? {
                    report.mappings_added += 1;
                }
            }
            report.concepts_visited += fetched;

            tracing::info!(
                offset,
                fetched,
                mappings_added = report.mappings_added,
                "Processed concept batch"
            );

            if fetched < self.batch_size {
                break;
            }
            offset += self.batch_size;
        }

        tracing::info!(
            pages = report.pages_fetched,
            concepts = report.concepts_visited,
            mappings_added = report.mappings_added,
            "Local mapping synchronization complete"
        );

        Ok(report)
    }
}
