use serde_json::{Map, Value};

use crate::address::{validate_token, Address};
use crate::error::{ModelError, ModelResult};
use crate::schema::{Model, NamespaceKind, NodeId};

/// Read view of the data bound to one address in a store.
#[derive(Debug)]
pub struct Namespace<'a> {
    address: Address,
    data: &'a Value,
}

impl<'a> Namespace<'a> {
    pub(crate) fn new(address: Address, data: &'a Value) -> Self {
        Self { address, data }
    }

    /// The concrete address this namespace is bound to.
    pub fn resolved_address(&self) -> &Address {
        &self.address
    }

    pub fn kind(&self) -> NamespaceKind {
        self.address.kind()
    }

    /// The live data of this namespace's subtree.
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Subtree serialized under the namespace's tag: `{ "<tag>": data }`.
    ///
    /// A component is keyed by its archetype's tag, so `widget/parts/0`
    /// serializes as `{ "part": ... }`, not under the extension point's tag.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(self.address.tag().to_string(), self.data.clone());
        Value::Object(out)
    }

    /// Visit the address of every populated component, in key order.
    ///
    /// Does nothing unless this namespace is an extension point.
    pub fn visit_extension_point_subcomponents(&self, mut visit: impl FnMut(Address)) {
        if self.kind() != NamespaceKind::ExtensionPoint {
            return;
        }
        let Some(components) = self.data.as_object() else {
            return;
        };
        for key in components.keys() {
            match self.address.component(key) {
                Ok(address) => visit(address),
                Err(e) => tracing::warn!(
                    address = %self.address,
                    key = %key,
                    error = %e,
                    "skipping malformed component key"
                ),
            }
        }
    }

    pub fn extension_point_subcomponents(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.visit_extension_point_subcomponents(|a| out.push(a));
        out
    }
}

/// Mutable view used to overwrite a namespace's subtree.
#[derive(Debug)]
pub struct NamespaceMut<'a> {
    address: Address,
    data: &'a mut Value,
}

impl<'a> NamespaceMut<'a> {
    pub(crate) fn new(address: Address, data: &'a mut Value) -> Self {
        Self { address, data }
    }

    pub fn resolved_address(&self) -> &Address {
        &self.address
    }

    pub fn as_namespace(&self) -> Namespace<'_> {
        Namespace::new(self.address.clone(), &*self.data)
    }

    /// Replace the whole subtree with `value`.
    ///
    /// The payload is checked against the schema before anything is written;
    /// on error the store is unchanged. Sub-namespaces missing from the
    /// payload are materialized from their defaults.
    pub fn from_json(&mut self, value: Value) -> ModelResult<()> {
        let normalized = normalize(self.address.model(), self.address.node(), value).map_err(
            |reason| ModelError::BadPayload {
                hash: self.address.hash_string(),
                reason,
            },
        )?;
        *self.data = normalized;
        Ok(())
    }
}

fn normalize(model: &Model, id: NodeId, value: Value) -> Result<Value, String> {
    let schema = model.node(id);
    let Value::Object(mut map) = value else {
        return Err(format!("'{}' expects a JSON object", schema.tag()));
    };

    match schema.kind() {
        NamespaceKind::Ordinary => {
            if let Some(unknown) = map
                .keys()
                .find(|k| {
                    !schema.properties().contains_key(*k) && model.child_by_tag(id, k).is_none()
                })
            {
                return Err(format!(
                    "'{}' has no property or sub-namespace '{unknown}'",
                    schema.tag()
                ));
            }
            for child in schema.children() {
                let tag = model.node(*child).tag().to_string();
                let data = match map.remove(&tag) {
                    Some(data) => normalize(model, *child, data)?,
                    None => model.default_data(*child),
                };
                map.insert(tag, data);
            }
            Ok(Value::Object(map))
        }
        NamespaceKind::ExtensionPoint => {
            let archetype = schema
                .archetype()
                .ok_or_else(|| format!("'{}' has no component archetype", schema.tag()))?;
            let mut components = Map::new();
            for (key, data) in map {
                validate_token(&key).map_err(|reason| format!("component key '{key}' {reason}"))?;
                let data = normalize(model, archetype, data)?;
                components.insert(key, data);
            }
            Ok(Value::Object(components))
        }
    }
}
