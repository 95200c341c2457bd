//! Local vs. subscribed concept classification

use crate::{
    model::Concept, repository::ConceptRepository, subscription::SubscriptionRegistry, Error,
    Result,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalityClassifier {
    repo: Arc<dyn ConceptRepository>,
    subscriptions: SubscriptionRegistry,
}

impl LocalityClassifier {
    pub fn new(repo: Arc<dyn ConceptRepository>, subscriptions: SubscriptionRegistry) -> Self {
        Self {
            repo,
            subscriptions,
        }
    }

    /// A concept is local unless one of its mappings points into a
    /// subscribed source. Concepts without mappings are local.
    pub async fn is_local(&self, concept: &Concept) -> Result<bool> {
        let subscribed = self.subscriptions.subscribed().await?;
        let foreign = concept
            .mappings
            .iter()
            .any(|mapping| subscribed.contains(&mapping.source));
        Ok(!foreign)
    }

    pub async fn is_local_by_id(&self, concept_id: i32) -> Result<bool> {
        let concept = self
            .repo
            .get_concept_by_id(concept_id)
            .await?
            .ok_or(Error::ConceptNotFound(concept_id))?;
        self.is_local(&concept).await
    }
}
