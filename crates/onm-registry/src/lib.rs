//! Registries and traversal for onm hosts.
//!
//! - [`ModelRegistry`] — read-only model name → compiled model map, built
//!   once at startup
//! - [`StoreRegistry`] — live stores keyed by generated UUIDs, each behind
//!   its own lock
//! - [`traverse`] — depth-first enumeration of every address reachable in
//!   a store

pub mod error;
pub mod models;
pub mod stores;
pub mod traverse;

pub use error::{RegistryError, RegistryResult};
pub use models::{ModelRegistry, ModelSummary};
pub use stores::{StoreHandle, StoreRegistry, StoreSummary};
pub use traverse::{traverse, traverse_root, Branch};
