//! Route paths and the JSON bodies exchanged on them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Route paths, relative to the configured prefix.
pub mod endpoints {
    pub const META: &str = "/meta";
    pub const MODELS: &str = "/models";
    pub const STORES: &str = "/stores";
    pub const ADDRESSES: &str = "/addresses";
    pub const ADDRESSES_OF_STORE: &str = "/addresses/:store";
    pub const ADDRESSES_AT: &str = "/addresses/:store/*address";
    pub const DATA: &str = "/data";
    pub const DATA_OF_STORE: &str = "/data/:store";
    pub const DATA_AT: &str = "/data/:store/*address";
    pub const CREATE_STORE: &str = "/create/store";
    pub const CREATE_COMPONENT: &str = "/create/component";
    pub const UPDATE_COMPONENT: &str = "/update/component";
    pub const REMOVE_STORES: &str = "/remove/stores";
    pub const REMOVE_STORE: &str = "/remove/store";
    pub const REMOVE_COMPONENT: &str = "/remove/component";
}

/// Parse a request body, treating an empty body as missing.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("Invalid request missing required request body.".into()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn required(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid request missing '{name}' property in request body."
            ))
        })
}

/// `POST /create/store`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateStoreRequest {
    #[serde(default)]
    pub model: Option<String>,
}

impl CreateStoreRequest {
    pub fn model(self) -> Result<String, ApiError> {
        required(self.model, "model")
    }
}

/// `POST /create/component`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateComponentRequest {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CreateComponentRequest {
    /// `(store, address)`, both required.
    pub fn into_parts(self) -> Result<(String, String), ApiError> {
        Ok((required(self.store, "store")?, required(self.address, "address")?))
    }
}

/// `POST /update/component`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateComponentRequest {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl UpdateComponentRequest {
    /// `(store, address, data)`, all required.
    pub fn into_parts(self) -> Result<(String, String, Value), ApiError> {
        let store = required(self.store, "store")?;
        let address = required(self.address, "address")?;
        let data = self.data.ok_or_else(|| {
            ApiError::BadRequest("Invalid request missing 'data' property in request body.".into())
        })?;
        Ok((store, address, data))
    }
}

/// `DELETE /remove/store` and `DELETE /remove/component`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoveRequest {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl RemoveRequest {
    /// `(store, address)`; without an address the whole store is removed.
    pub fn into_parts(self) -> Result<(String, Option<String>), ApiError> {
        let store = required(self.store, "store")?;
        Ok((store, self.address.filter(|a| !a.is_empty())))
    }
}

/// Store and address of a read, from path segments or query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Locator {
    /// Path segments take precedence over query parameters.
    pub fn merge(path_store: Option<String>, path_address: Option<String>, query: Locator) -> Self {
        Self {
            store: path_store.or(query.store).filter(|s| !s.is_empty()),
            address: path_address.or(query.address).filter(|a| !a.is_empty()),
        }
    }
}
