use std::path::PathBuf;

use onm_model::ModelError;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model already registered: {0}")]
    DuplicateModel(String),

    #[error("unknown store: {0}")]
    UnknownStore(String),

    #[error("model file {}: {source}", .path.display())]
    ModelFile { path: PathBuf, source: ModelError },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("lock poisoned: {0}")]
    Poisoned(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
