use std::path::{Path, PathBuf};
use std::sync::Arc;

use geo_sieve::{Feature, LogContext, ModelRegistry, ProcessingOrchestrator, ProcessorConfig};
use serde_json::{Value, json};

/// Shared built-in catalogue
#[must_use]
pub fn registry() -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::builtin().expect("built-in models load"))
}

/// Settings for tests: nothing written unless a test opts in, no progress bars
#[must_use]
pub fn test_config() -> ProcessorConfig {
    ProcessorConfig {
        show_progress: false,
        max_workers: 2,
        ..ProcessorConfig::in_memory()
    }
}

/// Settings writing every output, without progress bars
#[must_use]
pub fn writing_config() -> ProcessorConfig {
    ProcessorConfig {
        show_progress: false,
        max_workers: 2,
        ..ProcessorConfig::default()
    }
}

/// Auto-detecting orchestrator over the built-in catalogue
#[must_use]
pub fn orchestrator(config: ProcessorConfig) -> ProcessingOrchestrator {
    ProcessingOrchestrator::new(registry(), config, LogContext::new("geo_sieve", "test"))
}

/// Orchestrator targeted at one built-in model
#[must_use]
pub fn targeted(model_id: &str, config: ProcessorConfig) -> ProcessingOrchestrator {
    ProcessingOrchestrator::targeted(registry(), config, model_id, LogContext::new("geo_sieve", "test"))
        .expect("model exists")
}

/// A GeoJSON feature object with a point geometry
#[must_use]
pub fn feature(properties: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "Point", "coordinates": [27.67, 46.23]}
    })
}

/// A library feature built from a property object
#[must_use]
pub fn lib_feature(properties: Value) -> Feature {
    Feature::new(properties.as_object().cloned().unwrap_or_default(), None)
}

/// Properties of a "case" record
#[must_use]
pub fn case_props(code: &str, locality: &str, street: &str, number: &str) -> Value {
    json!({
        "COD_FTTB": code,
        "DENUMIRE_ART": street,
        "NR_ART": number,
        "LOCALITATE": locality,
        "TIP_ART": "Strada",
        "STARE_RETEA": "activ"
    })
}

/// A FeatureCollection document
#[must_use]
pub fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "name": "test", "features": features})
}

#[must_use]
pub fn to_bytes(doc: &Value) -> Vec<u8> {
    serde_json::to_vec(doc).expect("serializable fixture")
}

/// Write a fixture document into `dir`
pub fn write_geojson(dir: &Path, name: &str, doc: &Value) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("fixture directory");
    }
    std::fs::write(&path, to_bytes(doc)).expect("fixture written");
    path
}

/// Parse a written GeoJSON output
pub fn read_output(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("output exists");
    serde_json::from_str(&text).expect("output is valid JSON")
}
