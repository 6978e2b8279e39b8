//! Error handling for geo-sieve.
//!
//! Only configuration failures are fatal to a run. Detection and file errors are
//! recorded per file, validation errors per feature, and structural rejections
//! are not errors at all (see [`crate::filter::Verdict`]).

use std::io;
use std::path::Path;

pub mod util;

/// Specialized error type for geo-sieve operations
#[derive(Debug, thiserror::Error)]
pub enum GeoSieveError {
    /// The model catalogue or run settings could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No declared model matches the observed property keys of a file
    #[error("No matching model found for {file} (observed fields: {})", observed_fields.join(", "))]
    ModelDetection {
        /// File whose first feature was inspected
        file: String,
        /// Property keys observed on that feature, upper-cased
        observed_fields: Vec<String>,
    },

    /// Decode, parse or structural failure for a whole input file
    #[error("Failed to process {file}: {message}")]
    FileProcessing {
        /// Offending file
        file: String,
        /// Human-readable reason
        message: String,
    },

    /// A field failed one of its declared rules
    #[error("{message}")]
    Validation {
        /// Field name as declared
        field: String,
        /// Rule that failed (`required`, `type_check`, `min_length`, ...)
        rule: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// A model id was requested that the registry does not declare
    #[error("Model error: {0}")]
    Model(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoSieveError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a file processing error for the given file
    pub fn file_processing(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::FileProcessing {
            file: file.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: &str, rule: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            rule,
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type for geo-sieve operations
pub type Result<T> = std::result::Result<T, GeoSieveError>;
