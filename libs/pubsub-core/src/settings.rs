//! Settings store and deployment identity
//!
//! The identity subsystem keeps its designations in a durable key/value store
//! shared with other processes. Values are read fresh on every operation.

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Setting holding the UUID of the local concept source
pub const LOCAL_NAMESPACE_UUID: &str = "local-namespace-uuid";

/// Setting holding the comma-separated UUIDs of subscribed sources
pub const SUBSCRIBED_NAMESPACE_UUIDS: &str = "subscribed-namespace-uuids";

/// Setting holding the deployment's implementation id
pub const IMPLEMENTATION_ID: &str = "implementation-id";

/// Durable string settings keyed by name
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a setting, returning `default` when it has never been written
    async fn get(&self, key: &str, default: &str) -> Result<String>;

    /// Create or overwrite a setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Source of the deployment-wide implementation identifier
#[async_trait]
pub trait ImplementationIdProvider: Send + Sync {
    async fn implementation_id(&self) -> Result<Option<String>>;
}

/// Reads the implementation id from the [`IMPLEMENTATION_ID`] setting
pub struct SettingsImplementationId {
    settings: Arc<dyn SettingsStore>,
}

impl SettingsImplementationId {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ImplementationIdProvider for SettingsImplementationId {
    async fn implementation_id(&self) -> Result<Option<String>> {
        let value = self.settings.get(IMPLEMENTATION_ID, "").await?;
        Ok(non_blank(value))
    }
}

/// A fixed implementation id, e.g. from static configuration
#[derive(Debug, Clone, Default)]
pub struct StaticImplementationId(Option<String>);

impl StaticImplementationId {
    pub fn new(id: Option<String>) -> Self {
        Self(id.and_then(non_blank))
    }
}

#[async_trait]
impl ImplementationIdProvider for StaticImplementationId {
    async fn implementation_id(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Split a comma-separated setting into trimmed, non-empty tokens
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Join tokens into the comma-separated form read by [`split_list`]
pub fn join_list<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
