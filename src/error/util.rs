//! Utility functions for error handling
//!
//! This module provides utility functions to make error handling more convenient.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{GeoSieveError, Result};

/// Read a whole file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to read
/// * `purpose` - Why the file is being read (for error context)
pub fn safe_read_file(path: &Path, purpose: &str) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(GeoSieveError::file_processing(
            path,
            format!("File not found (needed for: {purpose})"),
        ));
    }

    if !path.is_file() {
        return Err(GeoSieveError::file_processing(
            path,
            format!("Path is not a file (expected a file for: {purpose})"),
        ));
    }

    fs::read(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to read file for {purpose}: {e}"),
        };
        GeoSieveError::file_processing(path, context)
    })
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(GeoSieveError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory not found: {} (needed for: {purpose})", path.display()),
        )));
    }

    if !path.is_dir() {
        return Err(GeoSieveError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Path is not a directory: {} (expected a directory for: {purpose})", path.display()),
        )));
    }

    fs::read_dir(path).map(|_| ()).map_err(|e| {
        GeoSieveError::Io(io::Error::new(
            e.kind(),
            format!("Cannot read directory {}: {e}", path.display()),
        ))
    })
}

/// Attach a file path to an IO or JSON failure
pub fn with_file_context<T, E: std::fmt::Display>(
    result: std::result::Result<T, E>,
    path: &Path,
    action: &str,
) -> Result<T> {
    result.map_err(|e| GeoSieveError::file_processing(path, format!("{action}: {e}")))
}
