#![allow(dead_code)]

use conceptpubsub_core::{
    memory::{MemoryConceptRepository, MemorySettingsStore},
    settings::StaticImplementationId,
    ConceptPubSubService, MappingStrategy,
};
use std::sync::Arc;

pub const IMPLEMENTATION_ID: &str = "CLINIC";

pub struct TestHarness {
    pub repo: Arc<MemoryConceptRepository>,
    pub settings: Arc<MemorySettingsStore>,
    pub service: ConceptPubSubService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(
            MemoryConceptRepository::new(),
            MemorySettingsStore::new(),
            Some(IMPLEMENTATION_ID),
        )
    }

    pub fn without_implementation_id() -> Self {
        Self::build(MemoryConceptRepository::new(), MemorySettingsStore::new(), None)
    }

    pub fn with_repo(repo: MemoryConceptRepository) -> Self {
        Self::build(repo, MemorySettingsStore::new(), Some(IMPLEMENTATION_ID))
    }

    pub fn build(
        repo: MemoryConceptRepository,
        settings: MemorySettingsStore,
        implementation_id: Option<&str>,
    ) -> Self {
        let repo = Arc::new(repo);
        let settings = Arc::new(settings);
        let service = ConceptPubSubService::new(
            repo.clone(),
            settings.clone(),
            Arc::new(StaticImplementationId::new(
                implementation_id.map(str::to_string),
            )),
        );
        Self {
            repo,
            settings,
            service,
        }
    }

    /// Rebuild the service with an explicit strategy over the same stores
    pub fn with_strategy(self, strategy: MappingStrategy) -> Self {
        let service = ConceptPubSubService::with_strategy(
            self.repo.clone(),
            self.settings.clone(),
            Arc::new(StaticImplementationId::new(Some(
                IMPLEMENTATION_ID.to_string(),
            ))),
            strategy,
        );
        Self { service, ..self }
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        let service = self.service.clone().with_batch_size(batch_size);
        Self { service, ..self }
    }
}
