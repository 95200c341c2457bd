//! Concept publish/subscribe service
//!
//! Wires the local source manager, subscription registry, synchronizer,
//! resolver and classifier over one set of injected collaborators.

use crate::{
    identifier::IdentifierResolver,
    local_source::LocalSourceManager,
    locality::LocalityClassifier,
    model::{Concept, ConceptSource},
    repository::ConceptRepository,
    settings::{ImplementationIdProvider, SettingsStore},
    strategy::MappingStrategy,
    subscription::{SubscribedNamespaces, SubscriptionRegistry},
    sync::{MappingSynchronizer, SyncReport},
    Result,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConceptPubSubService {
    local_sources: LocalSourceManager,
    subscriptions: SubscriptionRegistry,
    synchronizer: MappingSynchronizer,
    resolver: IdentifierResolver,
    classifier: LocalityClassifier,
}

impl ConceptPubSubService {
    /// Compose the service, detecting the mapping strategy from the
    /// repository's capabilities
    pub fn new(
        repo: Arc<dyn ConceptRepository>,
        settings: Arc<dyn SettingsStore>,
        identity: Arc<dyn ImplementationIdProvider>,
    ) -> Self {
        let strategy = MappingStrategy::detect(repo.as_ref());
        Self::with_strategy(repo, settings, identity, strategy)
    }

    pub fn with_strategy(
        repo: Arc<dyn ConceptRepository>,
        settings: Arc<dyn SettingsStore>,
        identity: Arc<dyn ImplementationIdProvider>,
        strategy: MappingStrategy,
    ) -> Self {
        let local_sources = LocalSourceManager::new(repo.clone(), settings.clone(), identity);
        let subscriptions = SubscriptionRegistry::new(repo.clone(), settings);
        let synchronizer = MappingSynchronizer::new(repo.clone(), local_sources.clone(), strategy);
        let resolver = IdentifierResolver::new(repo.clone());
        let classifier = LocalityClassifier::new(repo, subscriptions.clone());

        Self {
            local_sources,
            subscriptions,
            synchronizer,
            resolver,
            classifier,
        }
    }

    /// Override the synchronization page size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.synchronizer = self.synchronizer.with_batch_size(batch_size);
        self
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.synchronizer.strategy()
    }

    pub fn batch_size(&self) -> usize {
        self.synchronizer.batch_size()
    }

    pub async fn create_local_namespace(&self) -> Result<ConceptSource> {
        self.local_sources.create().await
    }

    pub async fn get_local_namespace(&self) -> Result<ConceptSource> {
        self.local_sources.get().await
    }

    pub async fn get_or_create_local_namespace(&self) -> Result<ConceptSource> {
        self.local_sources.get_or_create().await
    }

    pub async fn get_concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>> {
        self.synchronizer.concepts(offset, limit).await
    }

    pub async fn add_local_mapping_to_concept(&self, concept: &mut Concept) -> Result<bool> {
        self.synchronizer.add_local_mapping(concept).await
    }

    pub async fn add_local_mapping_by_id(&self, concept_id: i32) -> Result<bool> {
        self.synchronizer.add_local_mapping_by_id(concept_id).await
    }

    pub async fn add_local_mappings_to_all_concepts(&self) -> Result<SyncReport> {
        self.synchronizer.add_local_mappings_to_all().await
    }

    pub async fn get_subscribed_namespaces(&self) -> Result<SubscribedNamespaces> {
        self.subscriptions.subscribed().await
    }

    pub async fn set_subscribed_namespaces(&self, uuids: &[Uuid]) -> Result<()> {
        self.subscriptions.set_subscribed(uuids).await
    }

    pub async fn is_local_concept(&self, concept: &Concept) -> Result<bool> {
        self.classifier.is_local(concept).await
    }

    pub async fn is_local_concept_by_id(&self, concept_id: i32) -> Result<bool> {
        self.classifier.is_local_by_id(concept_id).await
    }

    pub async fn resolve_concept(&self, identifier: &str) -> Result<Option<Concept>> {
        self.resolver.resolve(identifier).await
    }

    pub async fn resolve_concept_by_id(&self, id: i32) -> Result<Option<Concept>> {
        self.resolver.resolve_id(id).await
    }
}
