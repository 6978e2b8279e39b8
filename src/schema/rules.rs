//! Declarative per-field validation rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GeoSieveError, Result};

/// JSON type a field value is expected to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Any type tag not listed above; never fails
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Whether `value` is of this type
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Unknown => true,
        }
    }

    /// Name used in messages
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Unknown => "unknown",
        }
    }
}

/// Serialized form of a field rule as it appears in the model catalogue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldRuleSpec {
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A field rule with its pattern compiled
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub required: bool,
    pub field_type: Option<FieldType>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Anchored at the start of the value only
    pub pattern: Option<Regex>,
}

impl FieldRule {
    /// Compile a rule spec for `field`
    pub fn compile(field: &str, spec: &FieldRuleSpec) -> Result<Self> {
        let pattern = spec
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(&format!("^(?:{p})")).map_err(|e| {
                    GeoSieveError::configuration(format!("Invalid pattern for field '{field}': {e}"))
                })
            })
            .transpose()?;

        if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
            if min > max {
                return Err(GeoSieveError::configuration(format!(
                    "Field '{field}': min_length {min} exceeds max_length {max}"
                )));
            }
        }

        Ok(Self {
            field: field.to_string(),
            required: spec.required,
            field_type: spec.field_type,
            min_length: spec.min_length,
            max_length: spec.max_length,
            min_value: spec.min_value,
            max_value: spec.max_value,
            pattern,
        })
    }

    /// Turn the rule back into its catalogue form
    #[must_use]
    pub fn to_spec(&self) -> FieldRuleSpec {
        FieldRuleSpec {
            required: self.required,
            field_type: self.field_type,
            min_length: self.min_length,
            max_length: self.max_length,
            min_value: self.min_value,
            max_value: self.max_value,
            pattern: self.pattern.as_ref().map(|re| {
                let s = re.as_str();
                s.strip_prefix("^(?:")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .unwrap_or(s)
                    .to_string()
            }),
        }
    }
}
