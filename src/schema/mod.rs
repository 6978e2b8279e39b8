//! Field rules and record validation.

pub mod rules;
pub mod validate;

pub use rules::{FieldRule, FieldRuleSpec, FieldType};
pub use validate::{ValidationOutcome, validate_field, validate_record};
