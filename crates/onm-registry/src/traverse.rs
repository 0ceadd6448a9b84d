//! Address enumeration over a store's namespace tree.
//!
//! Traversal is a depth-first, pre-order walk. Each visited namespace is
//! classified as a [`Branch`]:
//!
//! - [`Branch::ExtensionPoint`] — children are the components currently
//!   populated in the store, in the order the namespace reports them.
//! - [`Branch::Ordinary`] — children are fixed by the schema, in
//!   declaration order.
//!
//! Every address is opened before it is emitted, so every hash string in
//! the output resolves in the store at the moment of traversal. The schema
//! is a tree, so the walk terminates without cycle detection.

use onm_model::{Address, ModelResult, Namespace, NamespaceKind, Store};

/// Child-enumeration strategy of one namespace.
#[derive(Debug)]
pub enum Branch<'a> {
    ExtensionPoint(Namespace<'a>),
    Ordinary(Namespace<'a>),
}

impl<'a> Branch<'a> {
    pub fn of(namespace: Namespace<'a>) -> Self {
        match namespace.kind() {
            NamespaceKind::ExtensionPoint => Self::ExtensionPoint(namespace),
            NamespaceKind::Ordinary => Self::Ordinary(namespace),
        }
    }

    pub fn children(&self) -> Vec<Address> {
        match self {
            Self::ExtensionPoint(namespace) => namespace.extension_point_subcomponents(),
            Self::Ordinary(namespace) => namespace.resolved_address().child_addresses(),
        }
    }
}

/// Every address reachable from `start`, root first.
///
/// Fails as a whole if `start` (or any address below it) cannot be opened;
/// no partial result is returned.
pub fn traverse(store: &Store, start: &Address) -> ModelResult<Vec<String>> {
    let mut out = Vec::new();
    visit(store, start, &mut out)?;
    tracing::debug!(start = %start, addresses = out.len(), "traversal complete");
    Ok(out)
}

/// [`traverse`] from the store's root namespace.
pub fn traverse_root(store: &Store) -> ModelResult<Vec<String>> {
    traverse(store, &store.root_address())
}

fn visit(store: &Store, address: &Address, out: &mut Vec<String>) -> ModelResult<()> {
    let branch = Branch::of(store.open_namespace(address)?);
    out.push(address.hash_string());
    for child in branch.children() {
        visit(store, &child, out)?;
    }
    Ok(())
}
