//! Cheap pre-dedup checks for substantively empty features.

use serde_json::{Map, Value};

use super::keys::StructuralIssue;
use crate::models::feature::is_populated;
use crate::models::result::RejectReason;

/// Result of gating one feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    EmptyProperties,
    NoSignal,
    /// A mandatory field is unpopulated; counted as invalid structure
    MissingMandatory(String),
}

impl GateOutcome {
    /// Rejection reason for a failing outcome
    #[must_use]
    pub fn into_rejection(self) -> Option<RejectReason> {
        match self {
            Self::Pass => None,
            Self::EmptyProperties => Some(RejectReason::EmptyProperties),
            Self::NoSignal => Some(RejectReason::NoSignal),
            Self::MissingMandatory(field) => {
                Some(RejectReason::Structural(StructuralIssue::MissingMandatory { field }))
            }
        }
    }
}

/// Per-model emptiness policy
///
/// A feature passes when its properties are non-empty, at least one signal
/// field is populated ("any populated field counts") and every mandatory field
/// is populated. An empty signal list accepts any non-empty feature.
#[derive(Debug, Clone, Default)]
pub struct FeatureGate {
    signal_fields: Vec<String>,
    mandatory_fields: Vec<String>,
}

impl FeatureGate {
    #[must_use]
    pub fn new(signal_fields: Vec<String>, mandatory_fields: Vec<String>) -> Self {
        Self { signal_fields, mandatory_fields }
    }

    /// True iff the property map has zero entries
    #[must_use]
    pub fn is_empty_properties(props: &Map<String, Value>) -> bool {
        props.is_empty()
    }

    /// True iff at least one of `signal_fields` holds a populated value
    #[must_use]
    pub fn has_required_signal(props: &Map<String, Value>, signal_fields: &[String]) -> bool {
        signal_fields
            .iter()
            .any(|field| props.get(field).is_some_and(is_populated))
    }

    /// First mandatory field that is absent or unpopulated
    #[must_use]
    pub fn missing_mandatory<'a>(&'a self, props: &Map<String, Value>) -> Option<&'a str> {
        self.mandatory_fields
            .iter()
            .find(|field| !props.get(field.as_str()).is_some_and(is_populated))
            .map(String::as_str)
    }

    /// Apply all checks in order
    #[must_use]
    pub fn check(&self, props: &Map<String, Value>) -> GateOutcome {
        if Self::is_empty_properties(props) {
            return GateOutcome::EmptyProperties;
        }
        if !self.signal_fields.is_empty() && !Self::has_required_signal(props, &self.signal_fields) {
            return GateOutcome::NoSignal;
        }
        match self.missing_mandatory(props) {
            Some(field) => GateOutcome::MissingMandatory(field.to_string()),
            None => GateOutcome::Pass,
        }
    }
}
