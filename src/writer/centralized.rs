//! Accumulation of accepted features across the files of one model.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;

use super::compact::write_collection;
use crate::error::Result;
use crate::models::feature::{Feature, value_text};
use crate::utils::logging::LogContext;

/// An accepted feature with its provenance
#[derive(Debug, Clone)]
pub struct CentralizedEntry {
    pub feature: Feature,
    pub source_file: String,
    pub timestamp: DateTime<Utc>,
}

/// Merges features from many files into one sorted collection
#[derive(Debug)]
pub struct CentralizingWriter {
    name: String,
    sort_field: String,
    entries: Vec<CentralizedEntry>,
    log: LogContext,
}

impl CentralizingWriter {
    /// Create a writer producing a collection called `name`, ordered by `sort_field`
    #[must_use]
    pub fn new(name: impl Into<String>, sort_field: impl Into<String>, log: LogContext) -> Self {
        Self {
            name: name.into(),
            sort_field: sort_field.into(),
            entries: Vec::new(),
            log,
        }
    }

    pub fn add(&mut self, feature: Feature, source_file: &str, timestamp: DateTime<Utc>) {
        self.entries.push(CentralizedEntry {
            feature,
            source_file: source_file.to_string(),
            timestamp,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[CentralizedEntry] {
        &self.entries
    }

    /// Number of distinct source files that contributed
    #[must_use]
    pub fn source_file_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.source_file.as_str())
            .collect::<FxHashSet<_>>()
            .len()
    }

    fn sort_key(&self, entry: &CentralizedEntry) -> String {
        entry
            .feature
            .properties
            .get(&self.sort_field)
            .map(|v| value_text(v).to_lowercase())
            .unwrap_or_default()
    }

    /// Entries sorted case-insensitively by the sort field
    ///
    /// The sort is stable; features without the field sort first.
    #[must_use]
    pub fn sorted(&self) -> Vec<&CentralizedEntry> {
        let mut keyed: Vec<(String, &CentralizedEntry)> =
            self.entries.iter().map(|e| (self.sort_key(e), e)).collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, e)| e).collect()
    }

    /// Write the merged collection to `path`
    ///
    /// Returns `None` without touching the file system when nothing was added.
    /// Output depends only on the accumulated features, so repeated flushes
    /// are byte-identical.
    pub fn flush(&self, path: &Path) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            self.log.warn("No centralized data to save");
            return Ok(None);
        }

        let sorted = self.sorted();
        write_collection(path, &self.name, sorted.iter().map(|e| &e.feature))?;
        self.log.info(format_args!(
            "Saved centralized file: {} ({} features)",
            path.display(),
            sorted.len()
        ));
        Ok(Some(path.to_path_buf()))
    }
}
