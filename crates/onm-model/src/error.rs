use thiserror::Error;

/// Errors produced by model, address, and store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid address '{hash}': {reason}")]
    InvalidAddress { hash: String, reason: String },

    #[error("address '{hash}' belongs to model '{actual}', store uses '{expected}'")]
    WrongModel {
        hash: String,
        expected: String,
        actual: String,
    },

    #[error("address '{0}' contains an unresolved component key")]
    UnresolvedAddress(String),

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("not a component address: {0}")]
    NotAComponent(String),

    #[error("component already exists: {0}")]
    ComponentExists(String),

    #[error("namespace cannot be removed: {0}")]
    NotRemovable(String),

    #[error("bad payload for '{hash}': {reason}")]
    BadPayload { hash: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
