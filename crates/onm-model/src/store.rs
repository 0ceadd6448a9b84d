use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::address::{Address, PLACEHOLDER_KEY};
use crate::error::{ModelError, ModelResult};
use crate::namespace::{Namespace, NamespaceMut};
use crate::schema::{Model, NodeId};

/// One instantiated model plus its live data.
///
/// The data is a JSON tree shaped by the model: every ordinary namespace is
/// an object holding its properties and one entry per sub-namespace, and
/// every extension point is an object mapping component keys to component
/// data.
pub struct Store {
    model: Arc<Model>,
    data: Value,
}

impl Store {
    /// Create a store whose root namespace holds the model's defaults.
    pub fn new(model: Arc<Model>) -> Self {
        let data = model.default_data(NodeId::ROOT);
        Self { model, data }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn root_address(&self) -> Address {
        self.model.root_address()
    }

    /// The root namespace's data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn open_namespace(&self, address: &Address) -> ModelResult<Namespace<'_>> {
        self.check_address(address)?;
        let data = self.locate(address)?;
        Ok(Namespace::new(address.clone(), data))
    }

    pub fn open_namespace_mut(&mut self, address: &Address) -> ModelResult<NamespaceMut<'_>> {
        self.check_address(address)?;
        let data = self.locate_mut(address)?;
        Ok(NamespaceMut::new(address.clone(), data))
    }

    /// Attach a new component at `address`.
    ///
    /// The address must name a component whose extension point already
    /// exists in this store. A `-` key is replaced by a freshly generated
    /// one; the returned namespace carries the resolved address.
    pub fn create_component(&mut self, address: &Address) -> ModelResult<Namespace<'_>> {
        self.check_model(address)?;
        if !address.is_component() {
            return Err(ModelError::NotAComponent(address.hash_string()));
        }
        let parent = address
            .parent()
            .ok_or_else(|| ModelError::NotAComponent(address.hash_string()))?;
        if !parent.is_resolved() {
            return Err(ModelError::UnresolvedAddress(address.hash_string()));
        }

        let resolved = if address.key() == PLACEHOLDER_KEY {
            address.with_key(&Uuid::new_v4().simple().to_string())
        } else {
            address.clone()
        };

        let defaults = self.model.default_data(resolved.node());
        let components = self
            .locate_mut(&parent)?
            .as_object_mut()
            .ok_or_else(|| ModelError::NamespaceNotFound(parent.hash_string()))?;
        if components.contains_key(resolved.key()) {
            return Err(ModelError::ComponentExists(resolved.hash_string()));
        }
        components.insert(resolved.key().to_string(), defaults);
        tracing::debug!(model = %self.model.name(), address = %resolved, "component created");

        self.open_namespace(&resolved)
    }

    /// Detach the component at `address` together with its subtree.
    pub fn remove_component(&mut self, address: &Address) -> ModelResult<()> {
        self.check_address(address)?;
        if address.is_root() {
            return Err(ModelError::NotRemovable(format!(
                "'{}' is the root namespace",
                address.hash_string()
            )));
        }
        if !address.is_component() {
            return Err(ModelError::NotRemovable(format!(
                "'{}' is fixed by the schema",
                address.hash_string()
            )));
        }
        let parent = address
            .parent()
            .ok_or_else(|| ModelError::NotRemovable(address.hash_string()))?;

        let removed = self
            .locate_mut(&parent)?
            .as_object_mut()
            .and_then(|components| components.remove(address.key()));
        if removed.is_none() {
            return Err(ModelError::NamespaceNotFound(address.hash_string()));
        }
        tracing::debug!(model = %self.model.name(), address = %address, "component removed");
        Ok(())
    }

    fn check_model(&self, address: &Address) -> ModelResult<()> {
        if address.model().name() != self.model.name() {
            return Err(ModelError::WrongModel {
                hash: address.hash_string(),
                expected: self.model.name().to_string(),
                actual: address.model().name().to_string(),
            });
        }
        Ok(())
    }

    fn check_address(&self, address: &Address) -> ModelResult<()> {
        self.check_model(address)?;
        if !address.is_resolved() {
            return Err(ModelError::UnresolvedAddress(address.hash_string()));
        }
        Ok(())
    }

    fn locate(&self, address: &Address) -> ModelResult<&Value> {
        let mut cursor = &self.data;
        for token in &address.tokens()[1..] {
            cursor = cursor
                .get(token.as_str())
                .ok_or_else(|| ModelError::NamespaceNotFound(address.hash_string()))?;
        }
        Ok(cursor)
    }

    fn locate_mut(&mut self, address: &Address) -> ModelResult<&mut Value> {
        let mut cursor = &mut self.data;
        for token in &address.tokens()[1..] {
            cursor = cursor
                .get_mut(token.as_str())
                .ok_or_else(|| ModelError::NamespaceNotFound(address.hash_string()))?;
        }
        Ok(cursor)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("model", &self.model.name())
            .finish()
    }
}
