//! Listing of the files in an output directory.
//!
//! A fixed set of priority names goes first, in the configured order and only
//! when present; every other `*.geojson` file follows by name.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::error::util::with_file_context;

/// File name of the manifest inside an output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// One listed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub modified: i64,
    pub path: String,
}

fn entry(path: &Path, name: &str, url_prefix: &str) -> Result<ManifestEntry> {
    let meta = std::fs::metadata(path)?;
    let modified = meta
        .modified()
        .map(|t| DateTime::<Utc>::from(t).timestamp())
        .unwrap_or_default();
    Ok(ManifestEntry {
        name: name.to_string(),
        size: meta.len(),
        modified,
        path: format!("{}/{name}", url_prefix.trim_end_matches('/')),
    })
}

/// List the GeoJSON files directly inside `dir`
///
/// # Arguments
/// * `dir` - Output directory of a model
/// * `url_prefix` - Prefix of each entry's `path`, e.g. `data/case`
/// * `priority` - Names pinned to the front
pub fn build_manifest(dir: &Path, url_prefix: &str, priority: &[String]) -> Result<Vec<ManifestEntry>> {
    let names = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| name.to_lowercase().ends_with(".geojson"))
        .collect_vec();

    let mut entries = Vec::with_capacity(names.len());
    for name in priority.iter().filter(|p| names.contains(p)).unique() {
        entries.push(entry(&dir.join(name), name, url_prefix)?);
    }
    for name in names.iter().filter(|n| !priority.contains(n)).sorted() {
        entries.push(entry(&dir.join(name), name, url_prefix)?);
    }
    Ok(entries)
}

/// Write `manifest.json` into `dir`, `None` when there is nothing to list
pub fn write_manifest(dir: &Path, url_prefix: &str, priority: &[String]) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        log::warn!("Output directory {} does not exist, cannot generate manifest", dir.display());
        return Ok(None);
    }
    let entries = build_manifest(dir, url_prefix, priority)?;
    if entries.is_empty() {
        log::warn!("No GeoJSON files found in {}", dir.display());
        return Ok(None);
    }

    let path = dir.join(MANIFEST_FILE);
    let text = serde_json::to_string_pretty(&entries)?;
    with_file_context(std::fs::write(&path, text + "\n"), &path, "Failed to write manifest")?;
    log::info!("Generated {} with {} entries", path.display(), entries.len());
    Ok(Some(path))
}
