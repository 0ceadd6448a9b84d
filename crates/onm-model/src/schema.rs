//! Model declarations and their compiled form.
//!
//! A [`ModelDeclaration`] is the JSON document a host loads at startup. It is
//! compiled once into an immutable [`Model`]: a flat arena of
//! [`SchemaNode`]s indexed by [`NodeId`], with the root at
//! [`NodeId::ROOT`]. Addresses and stores refer to schema positions by id,
//! so walking the schema never has to re-validate tags.
//!
//! # Invariants
//!
//! - Tags are non-empty, contain no `/`, are never the placeholder `-`, and
//!   are unique among siblings.
//! - Extension points carry exactly one component archetype and no
//!   sub-namespaces or properties.
//! - Ordinary namespaces never carry an archetype.
//! - The schema is a tree, so every walk over it terminates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::{validate_token, Address};
use crate::error::{ModelError, ModelResult};

/// The two namespace kinds the host distinguishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamespaceKind {
    /// Children are fixed by the schema.
    #[default]
    #[serde(rename = "child", alias = "ordinary")]
    Ordinary,
    /// Children are the components currently populated in the store.
    ExtensionPoint,
}

impl NamespaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinary => "child",
            Self::ExtensionPoint => "extensionPoint",
        }
    }
}

impl std::fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one namespace in a model file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDeclaration {
    pub json_tag: String,
    #[serde(default)]
    pub namespace_type: NamespaceKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_namespaces: Vec<NamespaceDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_archetype: Option<Box<NamespaceDeclaration>>,
}

impl NamespaceDeclaration {
    /// An ordinary namespace with no properties or children.
    pub fn child(tag: impl Into<String>) -> Self {
        Self {
            json_tag: tag.into(),
            namespace_type: NamespaceKind::Ordinary,
            properties: Map::new(),
            sub_namespaces: Vec::new(),
            component_archetype: None,
        }
    }

    /// An extension point whose components follow `archetype`.
    pub fn extension_point(tag: impl Into<String>, archetype: NamespaceDeclaration) -> Self {
        Self {
            json_tag: tag.into(),
            namespace_type: NamespaceKind::ExtensionPoint,
            properties: Map::new(),
            sub_namespaces: Vec::new(),
            component_archetype: Some(Box::new(archetype)),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, default: Value) -> Self {
        self.properties.insert(name.into(), default);
        self
    }

    pub fn with_sub_namespace(mut self, sub: NamespaceDeclaration) -> Self {
        self.sub_namespaces.push(sub);
        self
    }
}

/// A model file: a named schema plus opaque package metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDeclaration {
    pub name: String,
    #[serde(default)]
    pub package: Value,
    pub schema: NamespaceDeclaration,
}

impl ModelDeclaration {
    pub fn new(name: impl Into<String>, schema: NamespaceDeclaration) -> Self {
        Self {
            name: name.into(),
            package: Value::Null,
            schema,
        }
    }

    pub fn from_json_str(text: &str) -> ModelResult<Self> {
        serde_json::from_str(text).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_value(value: Value) -> ModelResult<Self> {
        serde_json::from_value(value).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn compile(self) -> ModelResult<Model> {
        Model::compile(self)
    }
}

/// Index of a node in a compiled [`Model`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// One compiled schema position.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    id: NodeId,
    tag: String,
    kind: NamespaceKind,
    properties: Map<String, Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    archetype: Option<NodeId>,
    component: bool,
}

impl SchemaNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> NamespaceKind {
        self.kind
    }

    /// Declared properties and their default values.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Schema-fixed children, in declaration order. Empty for extension points.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn archetype(&self) -> Option<NodeId> {
        self.archetype
    }

    /// Whether this node is the archetype of an extension point.
    pub fn is_component(&self) -> bool {
        self.component
    }
}

/// A compiled, immutable data model.
#[derive(Debug)]
pub struct Model {
    name: String,
    package: Value,
    nodes: Vec<SchemaNode>,
}

impl Model {
    /// Validate a declaration and flatten it into a node arena.
    pub fn compile(declaration: ModelDeclaration) -> ModelResult<Self> {
        if declaration.name.trim().is_empty() {
            return Err(ModelError::InvalidSchema("model name must not be empty".into()));
        }
        let mut nodes = Vec::new();
        push_node(&mut nodes, &declaration.schema, None, false)?;
        tracing::debug!(model = %declaration.name, nodes = nodes.len(), "compiled model");
        Ok(Self {
            name: declaration.name,
            package: declaration.package,
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &Value {
        &self.package
    }

    pub fn root(&self) -> &SchemaNode {
        self.node(NodeId::ROOT)
    }

    pub fn root_tag(&self) -> &str {
        self.root().tag()
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Number of schema positions in the model.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child_by_tag(&self, id: NodeId, tag: &str) -> Option<&SchemaNode> {
        self.node(id)
            .children
            .iter()
            .map(|child| self.node(*child))
            .find(|child| child.tag == tag)
    }

    pub fn root_address(self: &Arc<Self>) -> Address {
        Address::root(Arc::clone(self))
    }

    /// Parse an address hash string against this model.
    pub fn create_address_from_hash_string(self: &Arc<Self>, hash: &str) -> ModelResult<Address> {
        Address::parse(self, hash)
    }

    /// Freshly materialized data for the namespace at `id`.
    ///
    /// Properties take their defaults, ordinary children are materialized
    /// recursively, and extension points start empty.
    pub fn default_data(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut data = node.properties.clone();
        if node.kind == NamespaceKind::Ordinary {
            for child in &node.children {
                data.insert(self.node(*child).tag.clone(), self.default_data(*child));
            }
        }
        Value::Object(data)
    }
}

fn push_node(
    nodes: &mut Vec<SchemaNode>,
    decl: &NamespaceDeclaration,
    parent: Option<NodeId>,
    component: bool,
) -> ModelResult<NodeId> {
    validate_token(&decl.json_tag)
        .map_err(|reason| ModelError::InvalidSchema(format!("tag '{}': {reason}", decl.json_tag)))?;

    match decl.namespace_type {
        NamespaceKind::Ordinary if decl.component_archetype.is_some() => {
            return Err(ModelError::InvalidSchema(format!(
                "'{}' declares a component archetype but is not an extension point",
                decl.json_tag
            )));
        }
        NamespaceKind::ExtensionPoint if decl.component_archetype.is_none() => {
            return Err(ModelError::InvalidSchema(format!(
                "extension point '{}' has no component archetype",
                decl.json_tag
            )));
        }
        NamespaceKind::ExtensionPoint
            if !decl.sub_namespaces.is_empty() || !decl.properties.is_empty() =>
        {
            return Err(ModelError::InvalidSchema(format!(
                "extension point '{}' cannot declare properties or sub-namespaces",
                decl.json_tag
            )));
        }
        _ => {}
    }

    let id = NodeId(nodes.len());
    nodes.push(SchemaNode {
        id,
        tag: decl.json_tag.clone(),
        kind: decl.namespace_type,
        properties: decl.properties.clone(),
        parent,
        children: Vec::new(),
        archetype: None,
        component,
    });

    let mut seen = HashSet::new();
    let mut children = Vec::with_capacity(decl.sub_namespaces.len());
    for sub in &decl.sub_namespaces {
        if !seen.insert(sub.json_tag.as_str()) {
            return Err(ModelError::InvalidSchema(format!(
                "duplicate sub-namespace '{}' under '{}'",
                sub.json_tag, decl.json_tag
            )));
        }
        if decl.properties.contains_key(&sub.json_tag) {
            return Err(ModelError::InvalidSchema(format!(
                "sub-namespace '{}' collides with a property of '{}'",
                sub.json_tag, decl.json_tag
            )));
        }
        children.push(push_node(nodes, sub, Some(id), false)?);
    }

    let archetype = match &decl.component_archetype {
        Some(archetype) => Some(push_node(nodes, archetype, Some(id), true)?),
        None => None,
    };

    let node = &mut nodes[id.0];
    node.children = children;
    node.archetype = archetype;
    Ok(id)
}
