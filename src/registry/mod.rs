//! Model catalogue for telecom GeoJSON layers
//!
//! The registry is loaded once from a JSON catalogue and is read-only
//! afterwards; it can be shared between threads behind an `Arc`.
//!
//! Declaration order is significant: detection walks models in the order they
//! appear in the catalogue and the first match wins.
//!
//! Built-in models:
//! - main layer: camereta, enclosure, hub, localitati, stalpi, zona_hub,
//!   zone_interventie, case, spliter, zona_pon, zona_spliter, fibra, scari,
//!   zona_pon_re_ftth1000
//! - search layer: fttb_search, scari_search, camereta_search, enclosure_search

pub mod detect;
pub mod extract;
pub mod model;

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GeoSieveError, Result};

pub use detect::ModelDetector;
pub use extract::FieldExtractor;
pub use model::{CategoryRule, Model, ModelLayer, ModelSpec, OutputSpec};

/// Catalogue compiled into the binary
pub const BUILTIN_MODELS: &str = include_str!("../../config/models.json");

/// Aggregate figures about a registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStatistics {
    pub total_models: usize,
    pub models_by_layer: BTreeMap<&'static str, usize>,
    pub average_required_fields: f64,
    pub average_extract_fields: f64,
}

/// Ordered, immutable set of models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    version: String,
    description: String,
    models: Vec<Model>,
    index: FxHashMap<String, usize>,
}

impl ModelRegistry {
    /// Load a catalogue file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GeoSieveError::configuration(format!(
                "Model configuration file {} cannot be read: {e}",
                path.display()
            ))
        })?;
        let registry = Self::from_json(&text)?;
        info!("Loaded {} models from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// The catalogue shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MODELS)
    }

    /// Parse a catalogue document
    ///
    /// The document is `{ "version", "description", "models": { id: spec } }`.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| GeoSieveError::configuration(format!("Failed to load models: {e}")))?;
        let Value::Object(mut root) = root else {
            return Err(GeoSieveError::configuration(
                "Failed to load models: catalogue must be a JSON object",
            ));
        };

        let version = root
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = root
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(Value::Object(entries)) = root.remove("models") else {
            return Err(GeoSieveError::configuration(
                "Failed to load models: missing 'models' object",
            ));
        };

        let mut models = Vec::with_capacity(entries.len());
        for (id, raw) in entries {
            let spec: ModelSpec = serde_json::from_value(raw).map_err(|e| {
                GeoSieveError::configuration(format!("Invalid model configuration for {id}: {e}"))
            })?;
            let model = Model::compile(&id, spec)?;
            debug!("Loaded model: {} ({})", model.id, model.name);
            models.push(model);
        }

        Ok(Self::from_models(version, description, models))
    }

    fn from_models(version: String, description: String, models: Vec<Model>) -> Self {
        let index = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        Self {
            version,
            description,
            models,
            index,
        }
    }

    /// Look up a model by id
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<&Model> {
        self.index.get(model_id).map(|&i| &self.models[i])
    }

    /// Look up a model by id, failing when it is not declared
    pub fn require(&self, model_id: &str) -> Result<&Model> {
        self.get(model_id)
            .ok_or_else(|| GeoSieveError::Model(format!("Model not found: {model_id}")))
    }

    /// All models in declaration order
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Model> {
        self.models.iter()
    }

    /// Model ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    /// Models of one layer, in declaration order
    pub fn by_layer(&self, layer: ModelLayer) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(move |m| m.layer == layer)
    }

    /// Detector over this registry
    #[must_use]
    pub fn detector(&self) -> ModelDetector<'_> {
        ModelDetector::new(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn statistics(&self) -> RegistryStatistics {
        let mut models_by_layer = BTreeMap::new();
        for model in &self.models {
            *models_by_layer.entry(model.layer.as_str()).or_insert(0) += 1;
        }
        let (required, extract) = self.models.iter().fold((0usize, 0usize), |(r, e), m| {
            (r + m.required_fields.len(), e + m.extract_fields.len())
        });
        let average = |total: usize| {
            if self.models.is_empty() {
                0.0
            } else {
                total as f64 / self.models.len() as f64
            }
        };

        RegistryStatistics {
            total_models: self.models.len(),
            models_by_layer,
            average_required_fields: average(required),
            average_extract_fields: average(extract),
        }
    }

    /// Catalogue document describing this registry
    pub fn export(&self) -> Result<Value> {
        let mut models = Map::new();
        for model in &self.models {
            models.insert(model.id.clone(), serde_json::to_value(model.to_spec())?);
        }
        Ok(serde_json::json!({
            "version": self.version,
            "description": self.description,
            "models": models,
        }))
    }
}
