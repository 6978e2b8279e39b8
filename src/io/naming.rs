//! File-name precondition of a model.

use crate::models::result::SkipReason;
use crate::registry::Model;

/// Check that `file_name` carries one of the model's markers
///
/// Markers are matched as substrings of the upper-cased name. A model without
/// markers accepts every file.
pub fn check_file_name(model: &Model, file_name: &str) -> Result<(), SkipReason> {
    if model.file_name_markers.is_empty() {
        return Ok(());
    }
    let upper = file_name.to_uppercase();
    if model
        .file_name_markers
        .iter()
        .any(|marker| upper.contains(&marker.to_uppercase()))
    {
        Ok(())
    } else {
        Err(SkipReason::FileNameMismatch {
            file: file_name.to_string(),
            markers: model.file_name_markers.clone(),
        })
    }
}
