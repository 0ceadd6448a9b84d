use std::sync::Arc;

use onm_registry::{ModelRegistry, StoreRegistry};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub models: Arc<ModelRegistry>,
    pub stores: Arc<StoreRegistry>,
}

impl AppState {
    /// Freeze `models` and start with no stores.
    pub fn new(models: ModelRegistry) -> Self {
        let models = Arc::new(models);
        let stores = Arc::new(StoreRegistry::new(Arc::clone(&models)));
        Self { models, stores }
    }
}
