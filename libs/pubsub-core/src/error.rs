//! Error types for concept publish/subscribe

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(i32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Missing or inconsistent settings required by the identity subsystem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Implementation id is not set")]
    MissingImplementationId,

    #[error(
        "Local concept source is not set in the {key} setting. \
         Create it with create_local_namespace to have it set automatically."
    )]
    LocalNamespaceNotSet { key: String },

    #[error(
        "Local concept source [{uuid}] set in the {key} setting does not exist. \
         Set it to an existing concept source."
    )]
    DanglingReference { key: String, uuid: String },
}
