//! Logging utilities
//!
//! One-line `info`/`warn` records for file-system operations that run outside
//! a [`super::LogContext`], such as input discovery.

use std::path::Path;
use std::time::Duration;

/// Log the start of an operation on `path`
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{operation} {}", path.display());
}

/// Log a finished operation with its item count and timing
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. `Found`
/// * `path` - Root the operation worked on
/// * `count` - Number of items produced
/// * `unit` - What the items are, e.g. `GeoJSON files`
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, count: usize, unit: &str, elapsed: Option<Duration>) {
    let timing = elapsed.map(|d| format!(" in {d:.2?}")).unwrap_or_default();
    log::info!("{operation} {count} {unit} under {}{timing}", path.display());
}

/// Log a warning, tagged with the path it concerns
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
