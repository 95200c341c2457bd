//! Local concept source management
//!
//! Each deployment owns exactly one local source, named after its
//! implementation id. The designation lives in the [`LOCAL_NAMESPACE_UUID`]
//! setting rather than on the source record.

use crate::{
    error::ConfigurationError,
    model::ConceptSource,
    repository::ConceptRepository,
    settings::{ImplementationIdProvider, SettingsStore, LOCAL_NAMESPACE_UUID},
    Result,
};
use std::sync::Arc;
use uuid::Uuid;

/// Appended to the implementation id to name the local source
pub const LOCAL_SOURCE_NAME_POSTFIX: &str = "+local";

/// Prefixed to the implementation id to describe the local source
pub const LOCAL_SOURCE_DESCRIPTION_PREFIX: &str = "Local concept source of ";

#[derive(Clone)]
pub struct LocalSourceManager {
    repo: Arc<dyn ConceptRepository>,
    settings: Arc<dyn SettingsStore>,
    identity: Arc<dyn ImplementationIdProvider>,
}

impl LocalSourceManager {
    pub fn new(
        repo: Arc<dyn ConceptRepository>,
        settings: Arc<dyn SettingsStore>,
        identity: Arc<dyn ImplementationIdProvider>,
    ) -> Self {
        Self {
            repo,
            settings,
            identity,
        }
    }

    /// Create the local source from the implementation id and record it.
    ///
    /// Not idempotent: every call saves a new source and repoints the
    /// setting at it. Use [`get_or_create`](Self::get_or_create) when an
    /// existing source should be kept.
    pub async fn create(&self) -> Result<ConceptSource> {
        let implementation_id = self
            .identity
            .implementation_id()
            .await?
            .ok_or(ConfigurationError::MissingImplementationId)?;

        let source = ConceptSource::new(
            format!("{}{}", implementation_id, LOCAL_SOURCE_NAME_POSTFIX),
            format!("{}{}", LOCAL_SOURCE_DESCRIPTION_PREFIX, implementation_id),
        );

        self.repo.save_source(&source).await?;
        self.settings
            .set(LOCAL_NAMESPACE_UUID, &source.uuid.to_string())
            .await?;

        tracing::info!(
            source = %source.name,
            uuid = %source.uuid,
            "Created local concept source"
        );

        Ok(source)
    }

    /// The source recorded in the local namespace setting
    pub async fn get(&self) -> Result<ConceptSource> {
        let value = self.settings.get(LOCAL_NAMESPACE_UUID, "").await?;
        let value = value.trim();

        if value.is_empty() {
            return Err(ConfigurationError::LocalNamespaceNotSet {
                key: LOCAL_NAMESPACE_UUID.to_string(),
            }
            .into());
        }

        let dangling = || ConfigurationError::DanglingReference {
            key: LOCAL_NAMESPACE_UUID.to_string(),
            uuid: value.to_string(),
        };

        // A value that is not a UUID cannot name any source either
        let uuid = Uuid::parse_str(value).map_err(|_| dangling())?;

        match self.repo.get_source_by_uuid(uuid).await? {
            Some(source) => Ok(source),
            None => Err(dangling().into()),
        }
    }

    /// The configured local source, creating it only if none is configured.
    ///
    /// A dangling setting is still an error; it is never papered over with a
    /// fresh source.
    pub async fn get_or_create(&self) -> Result<ConceptSource> {
        match self.get().await {
            Ok(source) => Ok(source),
            Err(crate::Error::Configuration(ConfigurationError::LocalNamespaceNotSet { .. })) => {
                self.create().await
            }
            Err(e) => Err(e),
        }
    }
}
