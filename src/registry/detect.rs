//! Model detection from observed property keys
//!
//! A model matches when every one of its required fields (upper-cased) is among
//! the observed keys (upper-cased). Models are tried in declaration order, so
//! when a file fits several models the first declared one wins.

use log::debug;
use rustc_hash::FxHashSet;

use super::{Model, ModelRegistry};

/// Upper-case a set of observed property keys
pub fn normalize_fields<I, S>(observed: I) -> FxHashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    observed.into_iter().map(|f| f.as_ref().to_uppercase()).collect()
}

/// Detection over a borrowed registry
#[derive(Debug, Clone, Copy)]
pub struct ModelDetector<'r> {
    registry: &'r ModelRegistry,
}

impl<'r> ModelDetector<'r> {
    #[must_use]
    pub fn new(registry: &'r ModelRegistry) -> Self {
        Self { registry }
    }

    /// First model, in declaration order, whose required fields are all observed
    #[must_use]
    pub fn detect_first<S: AsRef<str>>(&self, observed: &[S]) -> Option<&'r Model> {
        let observed = normalize_fields(observed);
        let found = self.registry.all().find(|m| matches(m, &observed));
        if let Some(model) = found {
            debug!("Detected model: {} (100% header match)", model.id);
        }
        found
    }

    /// Every matching model, in declaration order
    #[must_use]
    pub fn detect_all<S: AsRef<str>>(&self, observed: &[S]) -> Vec<&'r Model> {
        let observed = normalize_fields(observed);
        let found: Vec<&Model> = self.registry.all().filter(|m| matches(m, &observed)).collect();
        if !found.is_empty() {
            debug!(
                "Found {} matching models: {}",
                found.len(),
                itertools::join(found.iter().map(|m| m.id.as_str()), ", ")
            );
        }
        found
    }
}

/// Required fields of `model` missing from the observed keys, as declared
#[must_use]
pub fn missing_required<S: AsRef<str>>(model: &Model, observed: &[S]) -> Vec<String> {
    let observed = normalize_fields(observed);
    model
        .required_fields
        .iter()
        .zip(model.required_upper())
        .filter(|(_, upper)| !observed.contains(upper.as_str()))
        .map(|(field, _)| field.clone())
        .collect()
}

fn matches(model: &Model, observed: &FxHashSet<String>) -> bool {
    model.required_upper().iter().all(|f| observed.contains(f))
}
