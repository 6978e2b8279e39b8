//! Model definitions as declared in the catalogue and as compiled for use.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GeoSieveError, Result};
use crate::filter::{FeatureGate, IdentityPolicy, SignaturePolicy};
use crate::schema::{FieldRule, FieldRuleSpec};

/// Default output sort field
pub const DEFAULT_SORT_FIELD: &str = "LOCALITATE";

fn default_sort_field() -> String {
    DEFAULT_SORT_FIELD.to_string()
}

fn default_category() -> String {
    "Other".to_string()
}

const fn yes() -> bool {
    true
}

/// Catalogue layer of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelLayer {
    Main,
    Search,
}

impl ModelLayer {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Search => "search",
        }
    }
}

/// Where and how a model's cleaned output is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSpec {
    /// Sub-directory of the output root; the model id when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Human title used in collection names; the model name when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "yes")]
    pub per_file: bool,
    #[serde(default = "yes")]
    pub centralized: bool,
    /// File names pinned to the front of the manifest
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub manifest_priority: Vec<String>,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            directory: None,
            title: None,
            per_file: true,
            centralized: true,
            manifest_priority: Vec::new(),
        }
    }
}

/// Catalogue form of a category tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySpec {
    pub field: String,
    pub equals: String,
    /// Source file marker to label, checked in order
    #[serde(default)]
    pub by_source: Map<String, Value>,
    #[serde(default = "default_category")]
    pub default: String,
}

/// Catalogue form of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub layer: ModelLayer,
    pub required_fields: Vec<String>,
    pub extract_fields: Vec<String>,
    #[serde(default, alias = "field_mappings", skip_serializing_if = "Map::is_empty")]
    pub field_rules: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_name_markers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signal_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mandatory_fields: Vec<String>,
    #[serde(default)]
    pub identity: IdentityPolicy,
    #[serde(default)]
    pub signature: SignaturePolicy,
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default)]
    pub output: OutputSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategorySpec>,
}

/// Category tally rule, e.g. street entries split by the folder they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub field: String,
    equals_lower: String,
    by_source: Vec<(String, String)>,
    pub default: String,
}

impl CategoryRule {
    fn compile(model: &str, spec: &CategorySpec) -> Result<Self> {
        let by_source = spec
            .by_source
            .iter()
            .map(|(marker, label)| match label {
                Value::String(label) => Ok((marker.to_lowercase(), label.clone())),
                other => Err(GeoSieveError::configuration(format!(
                    "Model '{model}': category label for '{marker}' must be a string, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            field: spec.field.clone(),
            equals_lower: spec.equals.to_lowercase(),
            by_source,
            default: spec.default.clone(),
        })
    }

    /// Label for a feature given its properties and source file name
    #[must_use]
    pub fn classify<'a>(&'a self, properties: &Map<String, Value>, source_file: &str) -> &'a str {
        let matches = properties
            .get(&self.field)
            .and_then(Value::as_str)
            .is_some_and(|v| v.to_lowercase() == self.equals_lower);
        if matches {
            let source = source_file.to_lowercase();
            if let Some((_, label)) = self.by_source.iter().find(|(marker, _)| source.contains(marker.as_str())) {
                return label;
            }
        }
        &self.default
    }

    fn to_spec(&self) -> CategorySpec {
        CategorySpec {
            field: self.field.clone(),
            equals: self.equals_lower.clone(),
            by_source: self
                .by_source
                .iter()
                .map(|(m, l)| (m.clone(), Value::String(l.clone())))
                .collect(),
            default: self.default.clone(),
        }
    }
}

/// A compiled, immutable model
#[derive(Debug, Clone)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: String,
    pub layer: ModelLayer,
    pub required_fields: Vec<String>,
    pub extract_fields: Vec<String>,
    pub rules: Vec<FieldRule>,
    pub file_name_markers: Vec<String>,
    pub signal_fields: Vec<String>,
    pub mandatory_fields: Vec<String>,
    pub identity: IdentityPolicy,
    pub signature: SignaturePolicy,
    pub sort_field: String,
    pub output: OutputSpec,
    pub categories: Option<CategoryRule>,
    required_upper: Vec<String>,
    declared: FxHashSet<String>,
}

fn check_names(model: &str, what: &str, names: &[String]) -> Result<()> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(GeoSieveError::configuration(format!(
            "Model '{model}': empty field name in {what}"
        )));
    }
    Ok(())
}

impl Model {
    /// Compile a catalogue entry
    ///
    /// Fails when a field name is empty, a rule is malformed, or the identity
    /// fields are all part of the signature (which would make the signature
    /// pass unreachable).
    pub fn compile(id: &str, spec: ModelSpec) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(GeoSieveError::configuration("Model id must not be empty"));
        }
        check_names(id, "required_fields", &spec.required_fields)?;
        check_names(id, "extract_fields", &spec.extract_fields)?;
        check_names(id, "signal_fields", &spec.signal_fields)?;
        check_names(id, "mandatory_fields", &spec.mandatory_fields)?;
        check_names(id, "identity", &spec.identity.fields)?;
        check_names(id, "signature", &spec.signature.fields)?;
        if spec.sort_field.trim().is_empty() {
            return Err(GeoSieveError::configuration(format!("Model '{id}': empty sort_field")));
        }

        let identity = &spec.identity.fields;
        if !identity.is_empty() && identity.iter().all(|f| spec.signature.fields.contains(f)) {
            return Err(GeoSieveError::configuration(format!(
                "Model '{id}': identity fields [{}] are all part of the signature; pick disjoint field sets",
                identity.join(", ")
            )));
        }

        let rules = spec
            .field_rules
            .iter()
            .map(|(field, raw)| {
                if field.trim().is_empty() {
                    return Err(GeoSieveError::configuration(format!(
                        "Model '{id}': empty field name in field_rules"
                    )));
                }
                let rule_spec: FieldRuleSpec = serde_json::from_value(raw.clone()).map_err(|e| {
                    GeoSieveError::configuration(format!("Model '{id}': rule for '{field}': {e}"))
                })?;
                FieldRule::compile(field, &rule_spec).map_err(|e| match e {
                    GeoSieveError::Configuration(msg) => {
                        GeoSieveError::configuration(format!("Model '{id}': {msg}"))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let categories = spec
            .categories
            .as_ref()
            .map(|c| CategoryRule::compile(id, c))
            .transpose()?;

        let required_upper = spec.required_fields.iter().map(|f| f.to_uppercase()).collect();
        let declared = spec
            .extract_fields
            .iter()
            .chain(&spec.required_fields)
            .chain(spec.field_rules.keys())
            .cloned()
            .collect();

        Ok(Self {
            id: id.to_string(),
            name: spec.name.unwrap_or_else(|| id.to_string()),
            description: spec.description,
            layer: spec.layer,
            required_fields: spec.required_fields,
            extract_fields: spec.extract_fields,
            rules,
            file_name_markers: spec.file_name_markers,
            signal_fields: spec.signal_fields,
            mandatory_fields: spec.mandatory_fields,
            identity: spec.identity,
            signature: spec.signature,
            sort_field: spec.sort_field,
            output: spec.output,
            categories,
            required_upper,
            declared,
        })
    }

    /// Required fields in upper case, as used at detection time
    #[must_use]
    pub fn required_upper(&self) -> &[String] {
        &self.required_upper
    }

    /// Whether an input key is known to this model (exact case)
    #[must_use]
    pub fn is_declared(&self, field: &str) -> bool {
        self.declared.contains(field)
    }

    /// Output sub-directory
    #[must_use]
    pub fn output_directory(&self) -> &str {
        self.output.directory.as_deref().unwrap_or(&self.id)
    }

    /// Title used in output collection names
    #[must_use]
    pub fn title(&self) -> &str {
        self.output.title.as_deref().unwrap_or(&self.name)
    }

    /// Gate built from this model's signal and mandatory fields
    #[must_use]
    pub fn gate(&self) -> FeatureGate {
        FeatureGate::new(self.signal_fields.clone(), self.mandatory_fields.clone())
    }

    /// Turn the model back into its catalogue form
    #[must_use]
    pub fn to_spec(&self) -> ModelSpec {
        ModelSpec {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            layer: self.layer,
            required_fields: self.required_fields.clone(),
            extract_fields: self.extract_fields.clone(),
            field_rules: self
                .rules
                .iter()
                .map(|r| {
                    let spec = serde_json::to_value(r.to_spec()).unwrap_or(Value::Null);
                    (r.field.clone(), spec)
                })
                .collect(),
            file_name_markers: self.file_name_markers.clone(),
            signal_fields: self.signal_fields.clone(),
            mandatory_fields: self.mandatory_fields.clone(),
            identity: self.identity.clone(),
            signature: self.signature.clone(),
            sort_field: self.sort_field.clone(),
            output: self.output.clone(),
            categories: self.categories.as_ref().map(CategoryRule::to_spec),
        }
    }
}
