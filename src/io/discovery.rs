//! Recursive discovery of GeoJSON input files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use itertools::Itertools;
use rayon::prelude::*;

use crate::error::util::validate_directory;
use crate::error::{GeoSieveError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

fn is_geojson(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson"))
}

/// Find every `*.geojson` file under `root`, sorted by path
///
/// # Arguments
/// * `root` - Directory to search recursively
/// * `exclude` - Optional directory to leave out, such as an output directory
///   nested inside the input tree
pub fn find_geojson_files(root: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let start = Instant::now();
    log_operation_start("Searching for GeoJSON files in", root);
    validate_directory(root, "GeoJSON input")?;

    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    let mut files = Vec::new();
    collect(root, exclude.as_deref(), &mut files)?;
    let files = files.into_iter().sorted().collect_vec();

    if files.is_empty() {
        log_warning("No GeoJSON files found in directory", Some(root));
    } else {
        log_operation_complete("Found", root, files.len(), "GeoJSON files", Some(start.elapsed()));
    }
    Ok(files)
}

fn collect(dir: &Path, exclude: Option<&Path>, out: &mut Vec<PathBuf>) -> Result<()> {
    if let Some(excluded) = exclude {
        if dir.canonicalize().is_ok_and(|d| d == excluded) {
            return Ok(());
        }
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| GeoSieveError::file_processing(dir, format!("Failed to read directory: {e}")))?
        .collect::<std::io::Result<Vec<_>>>()?;

    // entries of one directory are classified in parallel, sub-directories walked after
    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) = entries
        .par_iter()
        .map(std::fs::DirEntry::path)
        .filter(|path| path.is_dir() || (path.is_file() && is_geojson(path)))
        .partition(|path| path.is_dir());

    out.extend(files);
    for sub in dirs.iter().sorted() {
        collect(sub, exclude, out)?;
    }
    Ok(())
}
