//! Per-file processing results and run-scoped duplicate counters.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::filter::keys::StructuralIssue;
use crate::models::feature::Feature;

/// Why a file was passed over without being processed
///
/// Skips are not failures: they come from the file-name precondition or, in
/// targeted runs, from a file that belongs to another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// None of the model's file-name markers occurs in the name
    FileNameMismatch { file: String, markers: Vec<String> },
    /// The first feature lacks some of the model's required fields
    RequiredFieldsMissing { file: String, model: String, missing: Vec<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNameMismatch { file, markers } => {
                write!(f, "{file}: name contains none of {}", markers.join(", "))
            }
            Self::RequiredFieldsMissing { file, model, missing } => {
                write!(f, "{file}: not a {model} file (missing {})", missing.join(", "))
            }
        }
    }
}

/// Why a single feature did not make it to the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The property map has no entries
    EmptyProperties,
    /// None of the signal fields is populated
    NoSignal,
    /// Identity or mandatory fields are unusable
    Structural(StructuralIssue),
    /// The narrow identity key was already seen
    PrimaryDuplicate { key: String },
    /// The broad signature was already seen
    SecondaryDuplicate,
    /// Field rules failed in strict mode
    Validation { errors: Vec<String> },
}

impl RejectReason {
    /// Whether the rejection is counted as a duplicate
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::PrimaryDuplicate { .. } | Self::SecondaryDuplicate)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProperties => write!(f, "empty properties"),
            Self::NoSignal => write!(f, "no populated signal field"),
            Self::Structural(issue) => write!(f, "invalid structure: {issue}"),
            Self::PrimaryDuplicate { key } => write!(f, "duplicate key {key}"),
            Self::SecondaryDuplicate => write!(f, "duplicate signature"),
            Self::Validation { errors } => write!(f, "validation failed: {}", errors.join("; ")),
        }
    }
}

/// A rejected feature, by its index in the input collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub index: usize,
    pub reason: RejectReason,
}

/// Feature tallies for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCounts {
    pub seen: usize,
    pub extracted: usize,
    /// Empty properties or no signal field
    pub empty_skipped: usize,
    /// Structural rejections
    pub invalid_skipped: usize,
    pub duplicates_skipped: usize,
    /// Strict-mode validation failures
    pub validation_rejected: usize,
}

impl FeatureCounts {
    /// Record a rejection under its class
    pub fn record(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::EmptyProperties | RejectReason::NoSignal => self.empty_skipped += 1,
            RejectReason::Structural(_) => self.invalid_skipped += 1,
            RejectReason::PrimaryDuplicate { .. } | RejectReason::SecondaryDuplicate => {
                self.duplicates_skipped += 1;
            }
            RejectReason::Validation { .. } => self.validation_rejected += 1,
        }
    }

    /// Total number of rejected features
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.empty_skipped + self.invalid_skipped + self.duplicates_skipped + self.validation_rejected
    }
}

impl std::ops::AddAssign for FeatureCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.seen += rhs.seen;
        self.extracted += rhs.extracted;
        self.empty_skipped += rhs.empty_skipped;
        self.invalid_skipped += rhs.invalid_skipped;
        self.duplicates_skipped += rhs.duplicates_skipped;
        self.validation_rejected += rhs.validation_rejected;
    }
}

/// Duplicate counters kept for the lifetime of one filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStats {
    pub total_duplicates_skipped: usize,
    pub duplicates_by_file: BTreeMap<String, usize>,
    pub primary_key_duplicates: usize,
}

impl DuplicateStats {
    /// Count one duplicate found in `file`
    pub fn record(&mut self, file: &str, primary: bool) {
        self.total_duplicates_skipped += 1;
        if primary {
            self.primary_key_duplicates += 1;
        }
        *self.duplicates_by_file.entry(file.to_string()).or_insert(0) += 1;
    }

    /// Duplicates rejected by the signature pass
    #[must_use]
    pub fn secondary_duplicates(&self) -> usize {
        self.total_duplicates_skipped - self.primary_key_duplicates
    }
}

/// Outcome of processing one input file
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    /// Base name of the input file
    pub file: String,
    pub model_detected: Option<String>,
    pub features_processed: usize,
    pub features_extracted: usize,
    pub counts: FeatureCounts,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Errors and warnings beyond the reporting cap, counted only
    pub suppressed_issues: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub processing_time: Duration,
    /// Accepted features, projected to the model's output shape
    #[serde(skip)]
    pub features: Vec<Feature>,
    pub rejections: Vec<Rejection>,
    pub skipped: Option<SkipReason>,
    pub metadata: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl ProcessingResult {
    /// An empty successful result for `file`
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            success: true,
            file: file.into(),
            model_detected: None,
            features_processed: 0,
            features_extracted: 0,
            counts: FeatureCounts::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            suppressed_issues: 0,
            processing_time: Duration::ZERO,
            features: Vec::new(),
            rejections: Vec::new(),
            skipped: None,
            metadata: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// A failed result carrying one error
    #[must_use]
    pub fn failure(file: impl Into<String>, error: impl fmt::Display) -> Self {
        let mut result = Self::new(file);
        result.success = false;
        result.errors.push(error.to_string());
        result
    }

    /// A result for a file that was passed over
    #[must_use]
    pub fn skip(file: impl Into<String>, reason: SkipReason) -> Self {
        let mut result = Self::new(file);
        result.skipped = Some(reason);
        result
    }

    /// Whether the file was skipped rather than processed
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Record a rejected feature
    pub fn reject(&mut self, index: usize, reason: RejectReason) {
        self.counts.record(&reason);
        self.rejections.push(Rejection { index, reason });
    }
}
