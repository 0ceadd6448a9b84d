//! The process-wide registry of live stores.
//!
//! Every store sits behind its own `RwLock`, so operations on different
//! stores never contend and operations on the same store are serialized.
//! The key → store map has a separate lock that is only held for the
//! duration of a single insert, lookup, or removal.
//!
//! Deleting a store removes it from the map and then *retires* it under the
//! store's own write lock. A handle obtained before the deletion sees the
//! retirement the next time it locks the store and reports
//! [`RegistryError::UnknownStore`], so no operation can succeed against a
//! store once its deletion has returned.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use onm_model::Store;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};
use crate::models::ModelRegistry;

/// One entry of [`StoreRegistry::list_stores`], also returned on creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    /// Root tag of the store's model.
    pub data_model: String,
    pub store_key: Uuid,
}

struct StoreCell {
    store: Store,
    retired: bool,
}

/// Shared handle to one registered store.
pub struct StoreHandle {
    key: Uuid,
    data_model: String,
    cell: RwLock<StoreCell>,
}

impl StoreHandle {
    fn new(key: Uuid, store: Store) -> Self {
        Self {
            key,
            data_model: store.model().root_tag().to_string(),
            cell: RwLock::new(StoreCell { store, retired: false }),
        }
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            data_model: self.data_model.clone(),
            store_key: self.key,
        }
    }

    /// Run `f` with shared access to the store.
    pub fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> RegistryResult<T> {
        let cell = self
            .cell
            .read()
            .map_err(|e| RegistryError::Poisoned(format!("store {}: {e}", self.key)))?;
        if cell.retired {
            return Err(RegistryError::UnknownStore(self.key.to_string()));
        }
        Ok(f(&cell.store))
    }

    /// Run `f` with exclusive access to the store.
    pub fn write<T>(&self, f: impl FnOnce(&mut Store) -> T) -> RegistryResult<T> {
        let mut cell = self
            .cell
            .write()
            .map_err(|e| RegistryError::Poisoned(format!("store {}: {e}", self.key)))?;
        if cell.retired {
            return Err(RegistryError::UnknownStore(self.key.to_string()));
        }
        Ok(f(&mut cell.store))
    }

    pub fn is_retired(&self) -> bool {
        self.cell.read().map(|cell| cell.retired).unwrap_or(true)
    }

    fn retire(&self) {
        // A poisoned store is retired all the same: nothing may use it again.
        let mut cell = match self.cell.write() {
            Ok(cell) => cell,
            Err(poisoned) => poisoned.into_inner(),
        };
        cell.retired = true;
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("key", &self.key)
            .field("data_model", &self.data_model)
            .finish()
    }
}

/// Store key → live store.
pub struct StoreRegistry {
    models: Arc<ModelRegistry>,
    stores: RwLock<HashMap<Uuid, Arc<StoreHandle>>>,
}

impl StoreRegistry {
    pub fn new(models: Arc<ModelRegistry>) -> Self {
        Self {
            models,
            stores: RwLock::new(HashMap::new()),
        }
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    /// Instantiate an empty store of `model_name` under a fresh key.
    pub fn create_store(&self, model_name: &str) -> RegistryResult<StoreSummary> {
        let model = self
            .models
            .get(model_name)
            .ok_or_else(|| RegistryError::UnknownModel(model_name.to_string()))?;

        let mut stores = self.stores_mut()?;
        let key = loop {
            let candidate = Uuid::new_v4();
            if !stores.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = Arc::new(StoreHandle::new(key, Store::new(model)));
        let summary = handle.summary();
        stores.insert(key, handle);
        drop(stores);

        tracing::info!(store = %key, model = model_name, "created in-memory data store");
        Ok(summary)
    }

    /// Snapshot of every live store, ordered by key.
    pub fn list_stores(&self) -> RegistryResult<Vec<StoreSummary>> {
        let stores = self.stores()?;
        let mut out: Vec<StoreSummary> = stores.values().map(|h| h.summary()).collect();
        out.sort_by_key(|s| s.store_key);
        Ok(out)
    }

    /// Look up a store by its textual key. Only the lowercase hyphenated
    /// form handed out on creation matches; anything else is simply absent.
    pub fn get_store(&self, key: &str) -> RegistryResult<Option<Arc<StoreHandle>>> {
        let Some(key) = canonical_key(key) else {
            return Ok(None);
        };
        Ok(self.stores()?.get(&key).cloned())
    }

    /// Like [`get_store`](Self::get_store), but absence is an error.
    pub fn require_store(&self, key: &str) -> RegistryResult<Arc<StoreHandle>> {
        self.get_store(key)?
            .ok_or_else(|| RegistryError::UnknownStore(key.to_string()))
    }

    pub fn read_store<T>(&self, key: &str, f: impl FnOnce(&Store) -> T) -> RegistryResult<T> {
        self.require_store(key)?.read(f)
    }

    pub fn write_store<T>(&self, key: &str, f: impl FnOnce(&mut Store) -> T) -> RegistryResult<T> {
        self.require_store(key)?.write(f)
    }

    /// Remove one store. Fails with `UnknownStore` if it is not registered.
    pub fn delete_store(&self, key: &str) -> RegistryResult<()> {
        let removed = match canonical_key(key) {
            Some(uuid) => self.stores_mut()?.remove(&uuid),
            None => None,
        };
        let handle = removed.ok_or_else(|| RegistryError::UnknownStore(key.to_string()))?;
        handle.retire();
        tracing::info!(store = %handle.key(), "deleted in-memory data store");
        Ok(())
    }

    /// Remove every store. Returns how many were removed.
    pub fn delete_all_stores(&self) -> RegistryResult<usize> {
        let drained: Vec<Arc<StoreHandle>> = self.stores_mut()?.drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.retire();
            tracing::info!(store = %handle.key(), "deleted in-memory data store");
        }
        Ok(drained.len())
    }

    pub fn len(&self) -> usize {
        self.stores().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stores(
        &self,
    ) -> RegistryResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, Arc<StoreHandle>>>> {
        self.stores
            .read()
            .map_err(|e| RegistryError::Poisoned(format!("store registry: {e}")))
    }

    fn stores_mut(
        &self,
    ) -> RegistryResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Arc<StoreHandle>>>> {
        self.stores
            .write()
            .map_err(|e| RegistryError::Poisoned(format!("store registry: {e}")))
    }
}

/// Parse `key` only if it is exactly the form a [`StoreSummary`] reports.
fn canonical_key(key: &str) -> Option<Uuid> {
    Uuid::parse_str(key)
        .ok()
        .filter(|uuid| uuid.hyphenated().to_string() == key)
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("models", &self.models.len())
            .field("stores", &self.len())
            .finish()
    }
}
