//! Concept publish/subscribe core
//!
//! Gives every concept in a deployment a stable identity in a locally owned
//! concept source, so that other systems can reference it as `source:code`
//! without knowing internal numeric keys:
//! - bootstrapping the local source from the implementation id
//! - batched synchronization of local mappings over all concepts
//! - resolving `id` / `source:code` identifiers
//! - classifying concepts as local or subscribed
//!
//! Storage and settings are reached through the [`ConceptRepository`] and
//! [`SettingsStore`] traits.
//!
//! # Examples
//!
//! ```rust,no_run
//! use conceptpubsub_core::{
//!     memory::{MemoryConceptRepository, MemorySettingsStore},
//!     settings::StaticImplementationId,
//!     ConceptPubSubService,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> conceptpubsub_core::Result<()> {
//! let service = ConceptPubSubService::new(
//!     Arc::new(MemoryConceptRepository::new()),
//!     Arc::new(MemorySettingsStore::new()),
//!     Arc::new(StaticImplementationId::new(Some("CLINIC".to_string()))),
//! );
//! service.create_local_namespace().await?;
//! let report = service.add_local_mappings_to_all_concepts().await?;
//! println!("added {} mappings", report.mappings_added);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod identifier;
pub mod local_source;
pub mod locality;
pub mod memory;
pub mod model;
pub mod repository;
pub mod service;
pub mod settings;
pub mod strategy;
pub mod subscription;
pub mod sync;

pub use error::{ConfigurationError, Error, Result};
pub use identifier::{ConceptIdentifier, IdentifierResolver};
pub use local_source::LocalSourceManager;
pub use locality::LocalityClassifier;
pub use model::{Concept, ConceptMap, ConceptReferenceTerm, ConceptSource};
pub use repository::ConceptRepository;
pub use service::ConceptPubSubService;
pub use settings::{ImplementationIdProvider, SettingsStore};
pub use strategy::MappingStrategy;
pub use subscription::{SubscribedNamespaces, SubscriptionRegistry};
pub use sync::{MappingSynchronizer, SyncReport, DEFAULT_BATCH_SIZE};
