//! Compact, line-oriented GeoJSON
//!
//! ```text
//! {
//! "type": "FeatureCollection",
//! "name": "<title>",
//! "features": [
//! { "type": "Feature", "properties": {...}, "geometry": {...} },
//! { "type": "Feature", "properties": {...}, "geometry": {...} }
//! ]
//! }
//! ```
//!
//! One feature per line keeps outputs diffable. Property keys are upper-cased
//! and a missing geometry is replaced with the default point.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{GeoSieveError, Result};
use crate::models::feature::{DEFAULT_GEOMETRY_JSON, Feature};

/// Copy of `props` with upper-cased keys
///
/// When two keys fold to the same name the later value wins and keeps the
/// position of the first.
#[must_use]
pub fn upper_case_keys(props: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(props.len());
    for (key, value) in props {
        out.insert(key.to_uppercase(), value.clone());
    }
    out
}

/// One feature as a single line, without a trailing comma
#[must_use]
pub fn render_feature(feature: &Feature) -> String {
    let props = Value::Object(upper_case_keys(&feature.properties));
    let geometry = match &feature.geometry {
        Some(g) if feature.has_geometry() => g.to_string(),
        _ => DEFAULT_GEOMETRY_JSON.to_string(),
    };
    format!(r#"{{ "type": "Feature", "properties": {props}, "geometry": {geometry} }}"#)
}

/// A whole collection in compact form
pub fn render_collection<'a>(name: &str, features: impl IntoIterator<Item = &'a Feature>) -> String {
    let mut out = String::new();
    out.push_str("{\n");
    out.push_str("\"type\": \"FeatureCollection\",\n");
    let _ = writeln!(out, "\"name\": {},", Value::String(name.to_string()));
    out.push_str("\"features\": [\n");

    let mut features = features.into_iter().peekable();
    while let Some(feature) = features.next() {
        out.push_str(&render_feature(feature));
        if features.peek().is_some() {
            out.push(',');
        }
        out.push('\n');
    }

    out.push_str("]\n");
    out.push_str("}\n");
    out
}

/// Render and write a collection, creating parent directories
pub fn write_collection<'a>(
    path: &Path,
    name: &str,
    features: impl IntoIterator<Item = &'a Feature>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GeoSieveError::file_processing(parent, format!("Failed to create output directory: {e}"))
        })?;
    }
    std::fs::write(path, render_collection(name, features))
        .map_err(|e| GeoSieveError::file_processing(path, format!("Failed to write output: {e}")))
}
