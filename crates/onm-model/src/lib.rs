//! Object namespace model.
//!
//! A model is a tree of namespace declarations. Ordinary namespaces have
//! children fixed by the schema; extension points hold a dynamic set of
//! components, each shaped by the extension point's archetype. A [`Store`]
//! is one instance of a model holding live JSON data, and an [`Address`]
//! names one position in it by a `/`-separated hash string.
//!
//! # Key Types
//!
//! - [`ModelDeclaration`] — the JSON document a model is loaded from
//! - [`Model`] — compiled, immutable schema
//! - [`Address`] — structural locator, parsed from a hash string
//! - [`Store`] — live data for one model instance
//! - [`Namespace`] / [`NamespaceMut`] — views bound to one address in a store

pub mod address;
pub mod error;
pub mod namespace;
pub mod schema;
pub mod store;

use serde::{Deserialize, Serialize};

pub use address::{Address, PLACEHOLDER_KEY};
pub use error::{ModelError, ModelResult};
pub use namespace::{Namespace, NamespaceMut};
pub use schema::{Model, ModelDeclaration, NamespaceDeclaration, NamespaceKind, NodeId, SchemaNode};
pub use store::Store;

/// Name, version, and description of a crate, as reported by host metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Package metadata of this model library.
pub fn package_info() -> PackageInfo {
    PackageInfo {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: env!("CARGO_PKG_DESCRIPTION").into(),
    }
}
