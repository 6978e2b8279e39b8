//! Run settings for the processing pipeline.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{GeoSieveError, Result};

/// Configuration for one processing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Whether the secondary (full signature) duplicate pass runs
    pub enable_duplicate_detection: bool,
    /// Whether field rules are checked per feature
    pub enable_validation: bool,
    /// Exclude features that fail validation instead of only warning
    pub strict_mode: bool,
    /// Errors and warnings kept verbatim per file; the rest are only counted
    pub max_reported_issues: usize,
    /// Write one cleaned file per input file (if the model asks for it)
    pub write_per_file: bool,
    /// Write the merged file of every model
    pub write_centralized: bool,
    /// Write `manifest.json` next to the outputs
    pub write_manifest: bool,
    /// Draw indicatif progress bars
    pub show_progress: bool,
    /// Worker threads used to run independent models side by side
    pub max_workers: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enable_duplicate_detection: true,
            enable_validation: true,
            strict_mode: false,
            max_reported_issues: 100,
            write_per_file: true,
            write_centralized: true,
            write_manifest: true,
            show_progress: true,
            max_workers: num_cpus::get(),
        }
    }
}

impl ProcessorConfig {
    /// Load settings from a JSON file, falling back to defaults when it is absent
    ///
    /// Unknown keys are ignored and missing keys take their default value. A file
    /// that exists but cannot be parsed is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            GeoSieveError::configuration(format!("Cannot read settings {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)
            .map_err(|e| GeoSieveError::configuration(format!("{}: {e}", path.display())))?;

        info!("Settings loaded from {}", path.display());
        Ok(config)
    }

    /// Parse settings from a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(text)
            .map_err(|e| GeoSieveError::configuration(format!("Invalid settings: {e}")))?;
        if config.max_workers == 0 {
            config.max_workers = 1;
        }
        Ok(config)
    }

    /// Builder-style toggle for the secondary duplicate pass
    #[must_use]
    pub fn with_duplicate_detection(mut self, enabled: bool) -> Self {
        self.enable_duplicate_detection = enabled;
        self
    }

    /// Builder-style toggle for strict validation
    #[must_use]
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Settings suited to library callers and tests: no files, no progress bars
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            write_per_file: false,
            write_centralized: false,
            write_manifest: false,
            show_progress: false,
            ..Self::default()
        }
    }
}

impl fmt::Display for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processor Configuration:")?;
        writeln!(f, "  Duplicate Detection: {}", if self.enable_duplicate_detection { "Enabled" } else { "Disabled" })?;
        writeln!(f, "  Validation: {}", self.enable_validation)?;
        writeln!(f, "  Strict Mode: {}", self.strict_mode)?;
        writeln!(f, "  Per-file Output: {}", self.write_per_file)?;
        writeln!(f, "  Centralized Output: {}", self.write_centralized)?;
        writeln!(f, "  Manifest: {}", self.write_manifest)?;
        writeln!(f, "  Workers: {}", self.max_workers)?;
        Ok(())
    }
}
