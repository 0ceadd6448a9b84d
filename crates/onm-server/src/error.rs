use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use onm_model::ModelError;
use onm_registry::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from server setup and lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Failures reported to HTTP clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    BadPayload(String),

    #[error("{0}")]
    ModelUnsupported(String),

    /// Address is outside the model's address space.
    #[error("{0}")]
    InvalidAddress(String),

    /// Address could not be constructed or opened while reading a store.
    #[error("{0}")]
    AddressNotResolvable(String),

    #[error("{0}")]
    UnknownStore(String),

    #[error("{0}")]
    UnknownComponent(String),

    #[error("{0}")]
    CreateConflict(String),

    #[error("{0}")]
    RemoveConflict(String),

    #[error("{0}")]
    Internal(String),
}

/// The collaborator call a [`ModelError`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Building an address for a mutation.
    ParseAddress,
    /// Building or opening an address for a read.
    Resolve,
    /// Opening the namespace an update targets.
    OpenForUpdate,
    /// Deserializing an update payload into a namespace.
    Deserialize,
    CreateComponent,
    RemoveComponent,
}

impl ApiError {
    /// Translate a model failure according to where it happened.
    pub fn from_model(stage: Stage, hash: &str, err: ModelError) -> Self {
        match stage {
            Stage::ParseAddress => Self::InvalidAddress(format!(
                "Invalid address '{hash}' is outside of the data model's address space: {err}"
            )),
            Stage::Resolve => {
                Self::AddressNotResolvable(format!("Unable to resolve address '{hash}': {err}"))
            }
            Stage::OpenForUpdate => {
                Self::UnknownComponent(format!("Data component '{hash}' does not exist: {err}"))
            }
            Stage::Deserialize => {
                Self::BadPayload(format!("Unable to de-serialize JSON data in request: {err}"))
            }
            Stage::CreateComponent => {
                Self::CreateConflict(format!("Unable to create component '{hash}': {err}"))
            }
            Stage::RemoveComponent => {
                Self::RemoveConflict(format!("Unable to remove component '{hash}': {err}"))
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::BadPayload(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnsupported(_) | Self::InvalidAddress(_) => StatusCode::FORBIDDEN,
            Self::UnknownStore(_) | Self::UnknownComponent(_) => StatusCode::NOT_FOUND,
            Self::AddressNotResolvable(_) | Self::CreateConflict(_) | Self::RemoveConflict(_) => {
                StatusCode::PRECONDITION_FAILED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error kind reported in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequest",
            Self::BadPayload(_) => "BadPayload",
            Self::ModelUnsupported(_) => "ModelUnsupported",
            Self::InvalidAddress(_) | Self::AddressNotResolvable(_) => "InvalidAddress",
            Self::UnknownStore(_) => "UnknownStore",
            Self::UnknownComponent(_) => "UnknownComponent",
            Self::CreateConflict(_) => "CreateConflict",
            Self::RemoveConflict(_) => "RemoveConflict",
            Self::Internal(_) => "Internal",
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownModel(name) => {
                Self::ModelUnsupported(format!(
                    "The specified onm data model '{name}' is unsupported by this server."
                ))
            }
            RegistryError::UnknownStore(key) => {
                Self::UnknownStore(format!(
                    "The specified onm data store '{key}' does not exist on this server."
                ))
            }
            RegistryError::DuplicateModel(_)
            | RegistryError::ModelFile { .. }
            | RegistryError::Model(_)
            | RegistryError::Poisoned(_)
            | RegistryError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

/// JSON body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
