//! GeoJSON feature and feature collection.
//!
//! Geometry is carried as an opaque JSON value and never interpreted.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{GeoSieveError, Result};

/// Geometry written for features that have none, as emitted in compact output
pub const DEFAULT_GEOMETRY_JSON: &str = r#"{"type": "Point", "coordinates": [0, 0]}"#;

fn feature_type() -> String {
    "Feature".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A GeoJSON feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

impl Feature {
    /// Create a feature from its parts
    #[must_use]
    pub fn new(properties: Map<String, Value>, geometry: Option<Value>) -> Self {
        Self {
            kind: feature_type(),
            properties,
            geometry,
        }
    }

    /// Whether the feature carries a usable geometry
    ///
    /// `null`, an empty object and an empty array all count as absent.
    #[must_use]
    pub fn has_geometry(&self) -> bool {
        match &self.geometry {
            None | Some(Value::Null) => false,
            Some(Value::Object(m)) => !m.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(_) => true,
        }
    }

    /// The geometry, or the default point when absent
    #[must_use]
    pub fn geometry_or_default(&self) -> Cow<'_, Value> {
        match &self.geometry {
            Some(g) if self.has_geometry() => Cow::Borrowed(g),
            _ => Cow::Owned(default_geometry()),
        }
    }

    /// Trimmed textual value of a property, empty when absent or null
    #[must_use]
    pub fn text(&self, key: &str) -> Cow<'_, str> {
        match self.properties.get(key) {
            Some(v) => trimmed(value_text(v)),
            None => Cow::Borrowed(""),
        }
    }
}

fn trimmed(text: Cow<'_, str>) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) if s.trim().len() == s.len() => Cow::Owned(s),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    }
}

/// The default point geometry as a value
#[must_use]
pub fn default_geometry() -> Value {
    serde_json::json!({"type": "Point", "coordinates": [0, 0]})
}

/// Textual form of a property value
///
/// Strings are used as-is, `null` becomes the empty string and anything else
/// is rendered as compact JSON.
#[must_use]
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Whether a value counts as populated: not null, not "", not [] and not {}
#[must_use]
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// A parsed GeoJSON feature collection
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub name: Option<String>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Build a collection from a decoded JSON document
    ///
    /// The document must be an object with a `features` array. Entries of the
    /// array that are not valid features are dropped and reported in the
    /// returned list instead of failing the file.
    pub fn from_value(value: Value, file: &str) -> Result<(Self, Vec<String>)> {
        let Value::Object(mut root) = value else {
            return Err(GeoSieveError::file_processing(
                file,
                "Invalid GeoJSON format: top level is not an object",
            ));
        };

        let features = match root.remove("features") {
            Some(Value::Array(features)) => features,
            Some(_) => {
                return Err(GeoSieveError::file_processing(
                    file,
                    "Invalid GeoJSON format: features must be a list",
                ));
            }
            None => {
                return Err(GeoSieveError::file_processing(
                    file,
                    "Invalid GeoJSON format: missing features",
                ));
            }
        };

        let name = root.get("name").and_then(Value::as_str).map(str::to_string);
        let mut parsed = Vec::with_capacity(features.len());
        let mut problems = Vec::new();
        for (i, raw) in features.into_iter().enumerate() {
            match serde_json::from_value::<Feature>(raw) {
                Ok(feature) => parsed.push(feature),
                Err(e) => problems.push(format!("Feature {i}: malformed feature ({e})")),
            }
        }

        Ok((Self { name, features: parsed }, problems))
    }

    /// Property keys of the first feature; detection looks at nothing else
    #[must_use]
    pub fn observed_fields(&self) -> Vec<String> {
        self.features
            .first()
            .map(|f| f.properties.keys().cloned().collect())
            .unwrap_or_default()
    }
}
