//! Progress reporting for batch runs, using the indicatif crate.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Style of the per-model file bar
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files {msg}";

/// Style of the bar counting finished models
pub const DEFAULT_GROUP_TEMPLATE: &str =
    "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} models ({percent}%) {msg}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Create a file progress bar with the standard style
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(style(DEFAULT_MAIN_TEMPLATE));
    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }
    pb
}

/// Create a multi-progress setup whose top bar counts models
#[must_use]
pub fn create_multi_progress(total: u64, description: Option<&str>) -> (MultiProgress, ProgressBar) {
    let mp = MultiProgress::new();
    let pb = ProgressBar::new(total);
    pb.set_style(style(DEFAULT_GROUP_TEMPLATE));
    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }
    let main_pb = mp.add(pb);
    (mp, main_pb)
}

/// A visible bar built by `make` when `visible`, a hidden one otherwise
#[must_use]
pub fn hidden_or(visible: bool, make: impl FnOnce() -> ProgressBar) -> ProgressBar {
    if visible { make() } else { ProgressBar::hidden() }
}

/// Finish a progress bar with an optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}

/// Add a per-model file bar under a multi-progress setup
#[must_use]
pub fn add_group_progress_bar(mp: &MultiProgress, length: u64, description: Option<&str>) -> ProgressBar {
    mp.add(create_main_progress_bar(length, description))
}
