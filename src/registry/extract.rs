//! Projection of raw properties onto a model's output shape.

use serde_json::{Map, Value};

use super::Model;
use crate::schema::{ValidationOutcome, validate_record};

/// Field extraction and validation for one model
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'m> {
    model: &'m Model,
}

impl<'m> FieldExtractor<'m> {
    #[must_use]
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// Copy the model's extract fields that exist in `properties`
    ///
    /// Keys are matched with their exact declared case; absent fields are
    /// omitted rather than defaulted.
    #[must_use]
    pub fn extract(&self, properties: &Map<String, Value>) -> Map<String, Value> {
        self.model
            .extract_fields
            .iter()
            .filter_map(|field| properties.get(field).map(|v| (field.clone(), v.clone())))
            .collect()
    }

    /// Check `properties` against the model's required fields and rules
    #[must_use]
    pub fn validate(&self, properties: &Map<String, Value>) -> ValidationOutcome {
        validate_record(
            &self.model.rules,
            &self.model.required_fields,
            |field| self.model.is_declared(field),
            properties,
        )
    }
}
