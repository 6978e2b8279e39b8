//! Two-pass duplicate filter.
//!
//! The primary pass (identity key) always runs, including its structural
//! checks. The secondary pass (signature hash) runs only while duplicate
//! detection is enabled, and skips features whose signature fields beyond the
//! identity are not all populated. Each pass has its own tracking set.

use rustc_hash::FxHashSet;

use super::keys::{IdentityPolicy, SignaturePolicy, StructuralIssue, identity_values, primary_key, signature_hash};
use crate::models::feature::Feature;
use crate::models::result::{DuplicateStats, RejectReason};
use crate::utils::logging::LogContext;

/// Terminal state of one feature's trip through the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    StructurallyInvalid(StructuralIssue),
    PrimaryDuplicate { key: String },
    SecondaryDuplicate,
}

impl Verdict {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Rejection reason, `None` when accepted
    #[must_use]
    pub fn into_rejection(self) -> Option<RejectReason> {
        match self {
            Self::Accepted => None,
            Self::StructurallyInvalid(issue) => Some(RejectReason::Structural(issue)),
            Self::PrimaryDuplicate { key } => Some(RejectReason::PrimaryDuplicate { key }),
            Self::SecondaryDuplicate => Some(RejectReason::SecondaryDuplicate),
        }
    }
}

/// Duplicate filter owning its key sets and counters for one run
#[derive(Debug)]
pub struct DuplicateFilter {
    identity: IdentityPolicy,
    signature: SignaturePolicy,
    enabled: bool,
    primary_keys: FxHashSet<String>,
    secondary_keys: FxHashSet<String>,
    stats: DuplicateStats,
    log: LogContext,
}

impl DuplicateFilter {
    /// Create an enabled filter
    #[must_use]
    pub fn new(identity: IdentityPolicy, signature: SignaturePolicy, log: LogContext) -> Self {
        Self {
            identity,
            signature,
            enabled: true,
            primary_keys: FxHashSet::default(),
            secondary_keys: FxHashSet::default(),
            stats: DuplicateStats::default(),
            log,
        }
    }

    /// Turn the secondary pass on or off; structural checks are unaffected
    pub fn configure(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether `feature` from `source_file` is kept
    pub fn accept(&mut self, feature: &Feature, source_file: &str) -> Verdict {
        let values = match identity_values(feature, &self.identity) {
            Ok(values) => values,
            Err(issue) => {
                self.log.debug(format_args!("{source_file}: rejected, {issue}"));
                return Verdict::StructurallyInvalid(issue);
            }
        };

        if !values.is_empty() {
            let key = primary_key(&values);
            if self.primary_keys.contains(&key) {
                self.stats.record(source_file, true);
                self.log.debug(format_args!("{source_file}: duplicate key {key}"));
                return Verdict::PrimaryDuplicate { key };
            }
            self.primary_keys.insert(key);
        }

        if !self.enabled {
            return Verdict::Accepted;
        }

        if let Some(hash) = signature_hash(feature, &self.signature, &self.identity.fields) {
            if !self.secondary_keys.insert(hash) {
                self.stats.record(source_file, false);
                self.log.debug(format_args!("{source_file}: duplicate signature"));
                return Verdict::SecondaryDuplicate;
            }
        }

        Verdict::Accepted
    }

    #[must_use]
    pub fn stats(&self) -> &DuplicateStats {
        &self.stats
    }

    /// Number of distinct identity keys admitted so far
    #[must_use]
    pub fn unique_primary_keys(&self) -> usize {
        self.primary_keys.len()
    }

    /// Forget every key and counter
    pub fn reset(&mut self) {
        self.primary_keys.clear();
        self.secondary_keys.clear();
        self.stats = DuplicateStats::default();
    }
}
