//! Subscribed concept sources
//!
//! Sources listed in [`SUBSCRIBED_NAMESPACE_UUIDS`] are treated as external:
//! concepts mapped into them were published elsewhere.

use crate::{
    model::ConceptSource,
    repository::ConceptRepository,
    settings::{split_list, SettingsStore, SUBSCRIBED_NAMESPACE_UUIDS},
    Result,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// The subscribed set as configured at the time it was read.
///
/// Configured tokens that name no source are kept as unresolved members
/// instead of failing the read. They never match a concept's mappings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscribedNamespaces {
    resolved: HashSet<ConceptSource>,
    unresolved: BTreeSet<String>,
}

impl SubscribedNamespaces {
    pub fn contains(&self, source: &ConceptSource) -> bool {
        self.resolved.contains(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &ConceptSource> {
        self.resolved.iter()
    }

    /// Configured tokens that did not resolve to a source
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Number of distinct members, unresolved ones included
    pub fn len(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct SubscriptionRegistry {
    repo: Arc<dyn ConceptRepository>,
    settings: Arc<dyn SettingsStore>,
}

impl SubscriptionRegistry {
    pub fn new(repo: Arc<dyn ConceptRepository>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { repo, settings }
    }

    /// Read and resolve the subscribed set. Never cached.
    pub async fn subscribed(&self) -> Result<SubscribedNamespaces> {
        let value = self.settings.get(SUBSCRIBED_NAMESPACE_UUIDS, "").await?;
        let mut subscribed = SubscribedNamespaces::default();

        for token in split_list(&value) {
            let source = match Uuid::parse_str(token) {
                Ok(uuid) => self.repo.get_source_by_uuid(uuid).await?,
                Err(_) => None,
            };

            match source {
                Some(source) => {
                    subscribed.resolved.insert(source);
                }
                None => {
                    tracing::warn!(
                        uuid = token,
                        setting = SUBSCRIBED_NAMESPACE_UUIDS,
                        "Subscribed concept source does not exist"
                    );
                    subscribed.unresolved.insert(token.to_string());
                }
            }
        }

        Ok(subscribed)
    }

    /// Overwrite the subscribed list
    pub async fn set_subscribed(&self, uuids: &[Uuid]) -> Result<()> {
        let value = crate::settings::join_list(uuids.iter().map(Uuid::to_string));
        self.settings.set(SUBSCRIBED_NAMESPACE_UUIDS, &value).await
    }
}
