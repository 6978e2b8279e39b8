//! Duplicate identity keys.
//!
//! Two keys are derived per feature: the narrow primary key (plain join of the
//! identity values) and the broad secondary signature (SHA-256 over the sorted
//! `FIELD:value` pairs, optionally followed by the canonical geometry). A
//! missing geometry hashes as the default point it is written out as.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use crate::models::feature::{Feature, value_text};

/// Separator between key components
pub const KEY_SEPARATOR: &str = "|";

/// A field whose trimmed value must have an exact character count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedLength {
    pub field: String,
    pub length: usize,
}

/// Fields forming the narrow "hard identity" key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityPolicy {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_length: Option<FixedLength>,
}

/// Fields forming the broad "full signature" key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignaturePolicy {
    pub fields: Vec<String>,
    pub include_geometry: bool,
}

impl SignaturePolicy {
    /// Whether there is anything to hash
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.include_geometry
    }
}

/// Why a feature's identity is unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralIssue {
    /// An identity field is absent or blank after trimming
    EmptyIdentity { field: String },
    /// A fixed-length field has the wrong number of characters
    LengthMismatch { field: String, expected: usize, actual: usize },
    /// A mandatory field is not populated
    MissingMandatory { field: String },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyIdentity { field } => write!(f, "empty {field}"),
            Self::LengthMismatch { field, expected, actual } => {
                write!(f, "invalid {field} length ({actual} chars, expected {expected})")
            }
            Self::MissingMandatory { field } => write!(f, "missing mandatory {field}"),
        }
    }
}

/// Trimmed identity values, in policy order
pub type IdentityValues<'a> = SmallVec<[Cow<'a, str>; 4]>;

/// Extract and check the identity values of a feature
///
/// Every identity field must be non-blank. The fixed-length field, when
/// declared, must then have exactly the declared number of characters.
pub fn identity_values<'a>(
    feature: &'a Feature,
    policy: &IdentityPolicy,
) -> Result<IdentityValues<'a>, StructuralIssue> {
    let mut values = IdentityValues::new();
    for field in &policy.fields {
        let value = feature.text(field);
        if value.is_empty() {
            return Err(StructuralIssue::EmptyIdentity { field: field.clone() });
        }
        values.push(value);
    }

    if let Some(rule) = &policy.fixed_length {
        let actual = feature.text(&rule.field).chars().count();
        if actual != rule.length {
            return Err(StructuralIssue::LengthMismatch {
                field: rule.field.clone(),
                expected: rule.length,
                actual,
            });
        }
    }

    Ok(values)
}

/// Join identity values into the primary key
#[must_use]
pub fn primary_key(values: &[Cow<'_, str>]) -> String {
    let mut key = String::with_capacity(values.iter().map(|v| v.len() + 1).sum());
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            key.push_str(KEY_SEPARATOR);
        }
        key.push_str(value);
    }
    key
}

/// Secondary signature of a feature
///
/// `None` when the policy is empty, or when a signature field outside
/// `identity` is blank on the feature: such a feature carries no more
/// information than its primary key and skips the secondary pass. Values
/// are not trimmed here.
#[must_use]
pub fn signature_hash(feature: &Feature, policy: &SignaturePolicy, identity: &[String]) -> Option<String> {
    if policy.is_empty() {
        return None;
    }
    let incomplete = policy
        .fields
        .iter()
        .filter(|field| !identity.contains(field))
        .any(|field| feature.text(field).is_empty());
    if incomplete {
        return None;
    }

    let mut pairs: Vec<String> = policy
        .fields
        .iter()
        .filter_map(|field| {
            feature
                .properties
                .get(field)
                .map(|v| format!("{field}:{}", value_text(v)))
        })
        .collect();
    pairs.sort();

    let mut combined = pairs.join(KEY_SEPARATOR);
    if policy.include_geometry {
        combined.push_str(KEY_SEPARATOR);
        combined.push_str(&canonical_json(&feature.geometry_or_default()));
    }

    Some(format!("{:x}", Sha256::digest(combined.as_bytes())))
}

/// Compact JSON with object keys sorted at every level
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
