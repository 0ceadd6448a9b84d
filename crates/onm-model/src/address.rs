//! Structural addresses into a model's namespace tree.
//!
//! The hash string of an address is the path of tags and component keys from
//! the root, joined with `/`:
//!
//! - `widget` — the root namespace
//! - `widget/parts` — a schema-fixed child
//! - `widget/parts/7f3a` — a component under the `parts` extension point
//! - `widget/parts/-` — an unresolved component; creating it assigns a key

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::schema::{Model, NamespaceKind, NodeId, SchemaNode};

/// Component key meaning "assign a fresh key on create".
pub const PLACEHOLDER_KEY: &str = "-";

/// Check one path token (tag or component key).
pub(crate) fn validate_token(token: &str) -> Result<(), String> {
    if token.is_empty() {
        return Err("must not be empty".into());
    }
    if token.contains('/') {
        return Err("must not contain '/'".into());
    }
    if token == PLACEHOLDER_KEY {
        return Err(format!("'{PLACEHOLDER_KEY}' is reserved for unresolved component keys"));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("must not contain whitespace or control characters".into());
    }
    Ok(())
}

/// A position in a model's namespace tree.
///
/// Addresses are value objects: two addresses are equal when they belong to
/// the same model and have the same hash string.
#[derive(Clone)]
pub struct Address {
    model: Arc<Model>,
    node: NodeId,
    tokens: Vec<String>,
}

impl Address {
    pub(crate) fn root(model: Arc<Model>) -> Self {
        let tokens = vec![model.root_tag().to_string()];
        Self {
            model,
            node: NodeId::ROOT,
            tokens,
        }
    }

    pub(crate) fn parse(model: &Arc<Model>, hash: &str) -> ModelResult<Self> {
        let invalid = |reason: String| ModelError::InvalidAddress {
            hash: hash.to_string(),
            reason,
        };

        let tokens: Vec<&str> = hash.split('/').collect();
        let (first, rest) = tokens
            .split_first()
            .ok_or_else(|| invalid("address is empty".into()))?;
        if *first != model.root_tag() {
            return Err(invalid(format!(
                "expected root tag '{}' of model '{}'",
                model.root_tag(),
                model.name()
            )));
        }

        let mut node = NodeId::ROOT;
        for token in rest {
            let current = model.node(node);
            node = match current.kind() {
                NamespaceKind::Ordinary => model
                    .child_by_tag(node, token)
                    .map(SchemaNode::id)
                    .ok_or_else(|| {
                        invalid(format!("'{}' has no sub-namespace '{token}'", current.tag()))
                    })?,
                NamespaceKind::ExtensionPoint => {
                    if *token != PLACEHOLDER_KEY {
                        validate_token(token)
                            .map_err(|reason| invalid(format!("component key {reason}")))?;
                    }
                    current
                        .archetype()
                        .ok_or_else(|| {
                            invalid(format!("'{}' has no component archetype", current.tag()))
                        })?
                }
            };
        }

        Ok(Self {
            model: Arc::clone(model),
            node,
            tokens: tokens.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn hash_string(&self) -> String {
        self.tokens.join("/")
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Schema position this address points at.
    pub fn schema(&self) -> &SchemaNode {
        self.model.node(self.node)
    }

    /// Tag of the namespace kind at this position.
    pub fn tag(&self) -> &str {
        self.schema().tag()
    }

    pub fn kind(&self) -> NamespaceKind {
        self.schema().kind()
    }

    /// Last path token: a tag, or the component key for components.
    pub fn key(&self) -> &str {
        self.tokens.last().map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.len() == 1
    }

    pub fn is_component(&self) -> bool {
        self.schema().is_component()
    }

    pub fn is_resolved(&self) -> bool {
        !self.tokens.iter().any(|t| t == PLACEHOLDER_KEY)
    }

    pub fn parent(&self) -> Option<Address> {
        let parent = self.schema().parent()?;
        Some(Self {
            model: Arc::clone(&self.model),
            node: parent,
            tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
        })
    }

    /// Schema-fixed child with the given tag.
    pub fn child(&self, tag: &str) -> ModelResult<Address> {
        let child = self
            .model
            .child_by_tag(self.node, tag)
            .ok_or_else(|| ModelError::InvalidAddress {
                hash: format!("{}/{tag}", self.hash_string()),
                reason: format!("'{}' has no sub-namespace '{tag}'", self.tag()),
            })?;
        Ok(self.extend(child.id(), tag))
    }

    /// Component with the given key under this extension point.
    pub fn component(&self, key: &str) -> ModelResult<Address> {
        let hash = format!("{}/{key}", self.hash_string());
        let archetype = self.schema().archetype().ok_or_else(|| ModelError::InvalidAddress {
            hash: hash.clone(),
            reason: format!("'{}' is not an extension point", self.tag()),
        })?;
        if key != PLACEHOLDER_KEY {
            validate_token(key).map_err(|reason| ModelError::InvalidAddress {
                hash,
                reason: format!("component key {reason}"),
            })?;
        }
        Ok(self.extend(archetype, key))
    }

    /// Same position with the last token replaced by `key`.
    pub(crate) fn with_key(&self, key: &str) -> Address {
        let mut tokens = self.tokens.clone();
        if let Some(last) = tokens.last_mut() {
            *last = key.to_string();
        }
        Self {
            model: Arc::clone(&self.model),
            node: self.node,
            tokens,
        }
    }

    /// Visit the schema-fixed children in declaration order.
    ///
    /// Extension points have no schema-fixed children; their components are
    /// enumerated through an opened namespace instead.
    pub fn visit_child_addresses(&self, mut visit: impl FnMut(Address)) {
        if self.kind() == NamespaceKind::ExtensionPoint {
            return;
        }
        for child in self.schema().children() {
            let tag = self.model.node(*child).tag();
            visit(self.extend(*child, tag));
        }
    }

    pub fn child_addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.visit_child_addresses(|a| out.push(a));
        out
    }

    fn extend(&self, node: NodeId, token: &str) -> Address {
        let mut tokens = self.tokens.clone();
        tokens.push(token.to_string());
        Self {
            model: Arc::clone(&self.model),
            node,
            tokens,
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.model.name() == other.model.name() && self.tokens == other.tokens
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name().hash(state);
        self.tokens.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("model", &self.model.name())
            .field("hash", &self.hash_string())
            .finish()
    }
}
