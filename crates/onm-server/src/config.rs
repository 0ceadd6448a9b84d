use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Path prefix every route is mounted under, e.g. `/onm`.
    pub route_prefix: String,
    /// Directory of `*.json` model declarations loaded at startup.
    pub models_dir: PathBuf,
    /// Route `DELETE /remove/stores`, which drops every store at once.
    pub enable_bulk_delete: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            route_prefix: String::new(),
            models_dir: PathBuf::from("models"),
            enable_bulk_delete: false,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The route prefix with a leading `/` and no trailing `/`; empty when
    /// routes are mounted at the root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.route_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
