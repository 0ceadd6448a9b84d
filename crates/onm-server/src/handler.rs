//! Request handlers.
//!
//! Every handler runs the same stages: validate the body, resolve the
//! store, resolve the address, perform the operation, map the outcome. The
//! store is always resolved before the address, so a request against a
//! missing store reports `UnknownStore` even when its address is also bad.
//! Store locks are taken and released inside a single synchronous closure;
//! no handler holds a lock across an `.await`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use onm_model::{Address, PackageInfo, Store};
use onm_registry::{traverse, ModelSummary, StoreHandle, StoreSummary};
use serde_json::{Map, Value};

use crate::error::{ApiError, Stage};
use crate::message::{
    parse_body, CreateComponentRequest, CreateStoreRequest, Locator, RemoveRequest,
    UpdateComponentRequest,
};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Package metadata of this host and of the model library.
pub async fn meta_handler() -> Json<BTreeMap<String, PackageInfo>> {
    let host = PackageInfo {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: env!("CARGO_PKG_DESCRIPTION").into(),
    };
    let library = onm_model::package_info();
    let mut packages = BTreeMap::new();
    packages.insert(host.name.clone(), host);
    packages.insert(library.name.clone(), library);
    Json(packages)
}

pub async fn models_handler(State(state): State<AppState>) -> Json<Vec<ModelSummary>> {
    Json(state.models.list_models())
}

pub async fn stores_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StoreSummary>>> {
    let stores = state
        .stores
        .list_stores()
        .map_err(ApiError::from)
        .inspect_err(|e| tracing::error!(error = %e, "store listing failed"))?;
    Ok(Json(stores))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub async fn addresses_handler(
    State(state): State<AppState>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_addresses(&state, Locator::merge(None, None, query))
}

pub async fn store_addresses_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_addresses(&state, Locator::merge(Some(store), None, query))
}

pub async fn address_addresses_handler(
    State(state): State<AppState>,
    Path((store, address)): Path<(String, String)>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_addresses(&state, Locator::merge(Some(store), Some(address), query))
}

pub async fn data_handler(
    State(state): State<AppState>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_data(&state, Locator::merge(None, None, query))
}

pub async fn store_data_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_data(&state, Locator::merge(Some(store), None, query))
}

pub async fn address_data_handler(
    State(state): State<AppState>,
    Path((store, address)): Path<(String, String)>,
    Query(query): Query<Locator>,
) -> ApiResult<Json<Value>> {
    read_data(&state, Locator::merge(Some(store), Some(address), query))
}

/// `{ "<store>": [hash, ...] }` for every address reachable from the
/// requested one (the store root by default).
fn read_addresses(state: &AppState, locator: Locator) -> ApiResult<Json<Value>> {
    let (key, handle) = locate_store(state, &locator)?;
    let addresses = handle
        .read(|store| {
            let (hash, address) = read_address(store, locator.address.as_deref())?;
            traverse(store, &address).map_err(|e| ApiError::from_model(Stage::Resolve, &hash, e))
        })
        .map_err(ApiError::from)
        .and_then(|traversed| traversed)
        .inspect_err(|e| {
            tracing::warn!(
                store = %key,
                address = ?locator.address,
                error = %e,
                "address traversal failed"
            )
        })?;

    let mut body = Map::new();
    body.insert(key, Value::from(addresses));
    Ok(Json(Value::Object(body)))
}

/// `{ "<tag>": data }` for the requested namespace (the store root by
/// default).
fn read_data(state: &AppState, locator: Locator) -> ApiResult<Json<Value>> {
    let (key, handle) = locate_store(state, &locator)?;
    let data = handle
        .read(|store| {
            let (hash, address) = read_address(store, locator.address.as_deref())?;
            let namespace = store
                .open_namespace(&address)
                .map_err(|e| ApiError::from_model(Stage::Resolve, &hash, e))?;
            Ok::<_, ApiError>(namespace.to_json())
        })
        .map_err(ApiError::from)
        .and_then(|read| read)
        .inspect_err(|e| {
            tracing::warn!(
                store = %key,
                address = ?locator.address,
                error = %e,
                "data read failed"
            )
        })?;
    Ok(Json(data))
}

fn locate_store(state: &AppState, locator: &Locator) -> ApiResult<(String, Arc<StoreHandle>)> {
    let key = locator
        .store
        .clone()
        .ok_or_else(|| ApiError::UnknownStore("No data store specified.".into()))
        .inspect_err(|e| tracing::warn!(error = %e, "read without a store"))?;
    let handle = state
        .stores
        .get_store(&key)
        .map_err(ApiError::from)
        .and_then(|found| {
            found.ok_or_else(|| {
                ApiError::UnknownStore(format!("Data store '{key}' does not exist."))
            })
        })
        .inspect_err(|e| tracing::warn!(store = %key, error = %e, "read against unknown store"))?;
    Ok((key, handle))
}

fn read_address(store: &Store, hash: Option<&str>) -> ApiResult<(String, Address)> {
    match hash {
        Some(hash) => {
            let address = store
                .model()
                .create_address_from_hash_string(hash)
                .map_err(|e| ApiError::from_model(Stage::Resolve, hash, e))?;
            Ok((hash.to_string(), address))
        }
        None => {
            let address = store.root_address();
            Ok((address.hash_string(), address))
        }
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub async fn create_store_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<StoreSummary>> {
    let model = parse_body::<CreateStoreRequest>(&body)
        .and_then(CreateStoreRequest::model)
        .inspect_err(|e| tracing::warn!(error = %e, "rejected store creation request"))?;
    let summary = state
        .stores
        .create_store(&model)
        .map_err(ApiError::from)
        .inspect_err(|e| tracing::warn!(model = %model, error = %e, "store creation failed"))?;
    Ok(Json(summary))
}

/// Responds `{ "address": "<resolved hash>", "<tag>": data }`.
pub async fn create_component_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let (key, hash) = parse_body::<CreateComponentRequest>(&body)
        .and_then(CreateComponentRequest::into_parts)
        .inspect_err(|e| tracing::warn!(error = %e, "rejected component creation request"))?;
    let handle = require_store(&state, &key)?;

    let record = handle
        .write(|store| {
            let address = mutation_address(store, &hash)?;
            let namespace = store
                .create_component(&address)
                .map_err(|e| ApiError::from_model(Stage::CreateComponent, &hash, e))?;
            let resolved = namespace.resolved_address();
            let mut record = Map::new();
            record.insert("address".into(), Value::String(resolved.hash_string()));
            record.insert(resolved.tag().to_string(), namespace.data().clone());
            tracing::info!(store = %key, address = %resolved, "created data component");
            Ok::<_, ApiError>(Value::Object(record))
        })
        .map_err(ApiError::from)
        .and_then(|created| created)
        .inspect_err(|e| {
            tracing::warn!(store = %key, address = %hash, error = %e, "component creation failed")
        })?;
    Ok(Json(record))
}

/// Replace the addressed namespace's subtree with the request's `data`.
pub async fn update_component_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let (key, hash, data) = parse_body::<UpdateComponentRequest>(&body)
        .and_then(UpdateComponentRequest::into_parts)
        .inspect_err(|e| tracing::warn!(error = %e, "rejected component update request"))?;
    let handle = require_store(&state, &key)?;

    handle
        .write(|store| {
            let address = mutation_address(store, &hash)?;
            let mut namespace = store
                .open_namespace_mut(&address)
                .map_err(|e| ApiError::from_model(Stage::OpenForUpdate, &hash, e))?;
            namespace
                .from_json(data)
                .map_err(|e| ApiError::from_model(Stage::Deserialize, &hash, e))
        })
        .map_err(ApiError::from)
        .and_then(|updated| updated)
        .inspect_err(|e| {
            tracing::warn!(store = %key, address = %hash, error = %e, "component update failed")
        })?;
    tracing::debug!(store = %key, address = %hash, "updated data component");
    Ok(StatusCode::NO_CONTENT)
}

/// Drop every store. Only routed when bulk deletion is enabled.
pub async fn remove_stores_handler(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let removed = state
        .stores
        .delete_all_stores()
        .map_err(ApiError::from)
        .inspect_err(|e| tracing::error!(error = %e, "bulk store deletion failed"))?;
    tracing::warn!(removed, "deleted all in-memory data stores");
    Ok(StatusCode::NO_CONTENT)
}

/// Remove the addressed component, or the whole store when no address is
/// given.
pub async fn remove_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<StatusCode> {
    let (key, hash) = parse_body::<RemoveRequest>(&body)
        .and_then(RemoveRequest::into_parts)
        .inspect_err(|e| tracing::warn!(error = %e, "rejected removal request"))?;
    let handle = require_store(&state, &key)?;

    let Some(hash) = hash else {
        state
            .stores
            .delete_store(&key)
            .map_err(ApiError::from)
            .inspect_err(|e| tracing::warn!(store = %key, error = %e, "store deletion failed"))?;
        return Ok(StatusCode::NO_CONTENT);
    };

    handle
        .write(|store| {
            let address = mutation_address(store, &hash)?;
            store
                .remove_component(&address)
                .map_err(|e| ApiError::from_model(Stage::RemoveComponent, &hash, e))
        })
        .map_err(ApiError::from)
        .and_then(|removed| removed)
        .inspect_err(|e| {
            tracing::warn!(store = %key, address = %hash, error = %e, "component removal failed")
        })?;
    tracing::info!(store = %key, address = %hash, "removed data component");
    Ok(StatusCode::NO_CONTENT)
}

fn require_store(state: &AppState, key: &str) -> ApiResult<Arc<StoreHandle>> {
    state
        .stores
        .require_store(key)
        .map_err(ApiError::from)
        .inspect_err(|e| tracing::warn!(store = %key, error = %e, "request against unknown store"))
}

fn mutation_address(store: &Store, hash: &str) -> ApiResult<Address> {
    store
        .model()
        .create_address_from_hash_string(hash)
        .map_err(|e| ApiError::from_model(Stage::ParseAddress, hash, e))
}
