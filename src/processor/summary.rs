//! Batch and per-model summaries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::models::result::{DuplicateStats, FeatureCounts, ProcessingResult};

/// What one model accumulated over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub model_type: String,
    /// Features held by the centralizing writer
    pub total_features: usize,
    pub duplicate_stats: DuplicateStats,
    /// Distinct files that contributed at least one feature
    pub files_processed: usize,
    pub unique_primary_keys: usize,
    /// Category tally, empty when the model declares none
    pub categories: BTreeMap<String, usize>,
}

/// A file that failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Model id for targeted runs, `auto` when models are detected per file
    pub label: String,
    pub files_attempted: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub counts: FeatureCounts,
    pub failures: Vec<FileFailure>,
    /// Failures of the run itself, such as an unwritable centralized file
    pub run_errors: Vec<String>,
    pub models: Vec<ModelSummary>,
    pub outputs: Vec<PathBuf>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchSummary {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Fold one file result into the totals
    pub fn record(&mut self, result: &ProcessingResult) {
        self.files_attempted += 1;
        if result.is_skipped() {
            self.files_skipped += 1;
        } else if result.success {
            self.files_succeeded += 1;
            self.counts += result.counts;
        } else {
            self.files_failed += 1;
            self.failures.push(FileFailure {
                file: result.file.clone(),
                reason: result.errors.join("; "),
            });
        }
    }

    /// True when no file and no run step failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.files_failed == 0 && self.run_errors.is_empty()
    }

    /// Total duplicates over every model of the run
    #[must_use]
    pub fn total_duplicates(&self) -> usize {
        self.counts.duplicates_skipped
    }

    /// Total structurally invalid or empty features
    #[must_use]
    pub fn total_invalid(&self) -> usize {
        self.counts.invalid_skipped + self.counts.empty_skipped
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Summary ({}):", self.label)?;
        writeln!(f, "  Files Attempted: {}", self.files_attempted)?;
        writeln!(f, "  Files Succeeded: {}", self.files_succeeded)?;
        writeln!(f, "  Files Failed: {}", self.files_failed)?;
        if self.files_skipped > 0 {
            writeln!(f, "  Files Skipped: {}", self.files_skipped)?;
        }
        writeln!(f, "  Features Accepted: {}", self.counts.extracted)?;
        writeln!(f, "  Duplicates Skipped: {}", self.total_duplicates())?;
        writeln!(f, "  Empty/Invalid Skipped: {}", self.total_invalid())?;
        if self.counts.validation_rejected > 0 {
            writeln!(f, "  Validation Rejected: {}", self.counts.validation_rejected)?;
        }
        for model in &self.models {
            writeln!(
                f,
                "  [{}] {} features from {} files, {} duplicates ({} by key), {} unique keys",
                model.model_type,
                model.total_features,
                model.files_processed,
                model.duplicate_stats.total_duplicates_skipped,
                model.duplicate_stats.primary_key_duplicates,
                model.unique_primary_keys
            )?;
            for (category, count) in &model.categories {
                writeln!(f, "      {category}: {count}")?;
            }
        }
        for failure in &self.failures {
            writeln!(f, "  FAILED {}: {}", failure.file, failure.reason)?;
        }
        for error in &self.run_errors {
            writeln!(f, "  ERROR {error}")?;
        }
        writeln!(f, "  Elapsed: {:.2?}", self.elapsed)?;
        Ok(())
    }
}
