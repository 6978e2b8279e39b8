//! Record validation against field rules.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::{Map, Value};

use super::rules::FieldRule;
use crate::error::{GeoSieveError, Result};

/// Result of validating one property map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// True when `errors` is empty; warnings do not affect validity
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Pass/fail per checked field
    pub per_field_pass: BTreeMap<String, bool>,
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Text a pattern is matched against
fn pattern_subject(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check one value against a rule
///
/// Rules run in the order required, type, length, numeric bounds, pattern and
/// stop at the first failure. An optional field that is absent or empty passes.
pub fn validate_field(rule: &FieldRule, value: Option<&Value>) -> Result<()> {
    let field = rule.field.as_str();

    if is_blank(value) {
        if rule.required {
            return Err(GeoSieveError::validation(
                field,
                "required",
                format!("Field '{field}' is required but is empty"),
            ));
        }
        return Ok(());
    }
    let Some(value) = value else { return Ok(()) };

    if let Some(expected) = rule.field_type {
        if !expected.matches(value) {
            return Err(GeoSieveError::validation(
                field,
                "type_check",
                format!(
                    "Field '{field}' has invalid type. Expected: {}, Got: {}",
                    expected.as_str(),
                    json_type_name(value)
                ),
            ));
        }
    }

    if let Value::String(s) = value {
        let len = s.chars().count();
        if let Some(min) = rule.min_length.filter(|&min| len < min) {
            return Err(GeoSieveError::validation(
                field,
                "min_length",
                format!("Field '{field}' is too short. Minimum length: {min}"),
            ));
        }
        if let Some(max) = rule.max_length.filter(|&max| len > max) {
            return Err(GeoSieveError::validation(
                field,
                "max_length",
                format!("Field '{field}' is too long. Maximum length: {max}"),
            ));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = rule.min_value.filter(|&min| n < min) {
            return Err(GeoSieveError::validation(
                field,
                "min_value",
                format!("Field '{field}' is too small. Minimum value: {min}"),
            ));
        }
        if let Some(max) = rule.max_value.filter(|&max| n > max) {
            return Err(GeoSieveError::validation(
                field,
                "max_value",
                format!("Field '{field}' is too large. Maximum value: {max}"),
            ));
        }
    }

    if let Some(re) = &rule.pattern {
        if !re.is_match(&pattern_subject(value)) {
            return Err(GeoSieveError::validation(
                field,
                "pattern",
                format!("Field '{field}' does not match required pattern: {}", rule.to_spec().pattern.unwrap_or_default()),
            ));
        }
    }

    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a property map
///
/// * `rules` - declared field rules, checked in declaration order
/// * `required` - fields that must be present and non-empty
/// * `is_declared` - whether an input key belongs to the model; keys that do
///   not produce a single combined warning
pub fn validate_record<'a>(
    rules: impl IntoIterator<Item = &'a FieldRule>,
    required: &[String],
    is_declared: impl Fn(&str) -> bool,
    properties: &Map<String, Value>,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for field in required {
        if is_blank(properties.get(field)) {
            outcome
                .errors
                .push(format!("Required field '{field}' is missing or empty"));
            outcome.per_field_pass.insert(field.clone(), false);
        }
    }

    for rule in rules {
        match validate_field(rule, properties.get(&rule.field)) {
            Ok(()) => {
                outcome.per_field_pass.entry(rule.field.clone()).or_insert(true);
            }
            Err(e) => {
                outcome.errors.push(e.to_string());
                outcome.per_field_pass.insert(rule.field.clone(), false);
            }
        }
    }

    let unknown = properties.keys().filter(|k| !is_declared(k)).join(", ");
    if !unknown.is_empty() {
        outcome.warnings.push(format!("Unknown fields found: {unknown}"));
    }

    outcome.is_valid = outcome.errors.is_empty();
    outcome
}
