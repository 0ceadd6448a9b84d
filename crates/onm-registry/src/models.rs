//! The registry of data models a host can instantiate stores from.
//!
//! The registry is populated once while the host starts (by registering
//! declarations or loading a directory of model files) and is only read
//! afterwards; hosts share it behind an `Arc` and never hand out `&mut`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use onm_model::{Model, ModelDeclaration};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RegistryError, RegistryResult};

/// One entry of [`ModelRegistry::list_models`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub model_name: String,
    pub model_package: Value,
}

/// Model name → compiled model.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every `*.json` file in `dir`, in file name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> RegistryResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            registry.load_file(&path)?;
        }
        tracing::info!(dir = %dir.display(), models = registry.len(), "loaded model directory");
        Ok(registry)
    }

    /// Compile and register a single model file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> RegistryResult<Arc<Model>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let model = ModelDeclaration::from_json_str(&text)
            .and_then(ModelDeclaration::compile)
            .map_err(|source| RegistryError::ModelFile {
                path: path.to_path_buf(),
                source,
            })?;
        let model = self.register(model)?;
        tracing::info!(model = %model.name(), path = %path.display(), "registered model");
        Ok(model)
    }

    pub fn register_declaration(
        &mut self,
        declaration: ModelDeclaration,
    ) -> RegistryResult<Arc<Model>> {
        self.register(declaration.compile()?)
    }

    pub fn register(&mut self, model: Model) -> RegistryResult<Arc<Model>> {
        if self.models.contains_key(model.name()) {
            return Err(RegistryError::DuplicateModel(model.name().to_string()));
        }
        let model = Arc::new(model);
        self.models.insert(model.name().to_string(), Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        self.models.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Snapshot of every registered model, sorted by name.
    pub fn list_models(&self) -> Vec<ModelSummary> {
        self.models
            .values()
            .map(|model| ModelSummary {
                model_name: model.name().to_string(),
                model_package: model.package().clone(),
            })
            .collect()
    }
}
