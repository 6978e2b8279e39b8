//! Console output utilities
//!
//! Plain stdout reports for the command line. Log lines go through the `log`
//! facade; these are the user-facing tables.

use itertools::Itertools;

use crate::processor::RunReport;
use crate::registry::{Model, ModelRegistry};

/// Print every model summary of a run, then the manifests
pub fn print_run_report(report: &RunReport) {
    for summary in &report.summaries {
        if summary.files_attempted == summary.files_skipped && summary.is_success() {
            println!("[{}] no matching files", summary.label);
            continue;
        }
        print!("{summary}");
    }
    for manifest in &report.manifests {
        println!("Manifest: {}", manifest.display());
    }
    for error in &report.manifest_errors {
        println!("Manifest FAILED: {error}");
    }
    let failed = report.summaries.iter().filter(|s| !s.is_success()).map(|s| s.label.as_str()).join(", ");
    if failed.is_empty() {
        println!("All models processed successfully");
    } else {
        println!("Models with failures: {failed}");
    }
}

/// Print the model catalogue in declaration order
pub fn print_models(registry: &ModelRegistry) {
    let stats = registry.statistics();
    println!(
        "Models v{} ({} total, {})",
        registry.version(),
        stats.total_models,
        stats.models_by_layer.iter().map(|(layer, n)| format!("{n} {layer}")).join(", ")
    );
    for model in registry.all() {
        println!("  {}", describe_model(model));
    }
}

/// One-line description of a model
#[must_use]
pub fn describe_model(model: &Model) -> String {
    let mut line = format!(
        "{:<22} {:<6} requires [{}]",
        model.id,
        model.layer.as_str(),
        model.required_fields.join(", ")
    );
    if !model.file_name_markers.is_empty() {
        line.push_str(&format!(" files *{}*", model.file_name_markers.join("*|*")));
    }
    line
}

/// Print the models a file matches, marking the one detection picks
pub fn print_detection(file: &str, observed: &[String], matches: &[&Model]) {
    println!("{file}: {} fields ({})", observed.len(), observed.iter().join(", "));
    if matches.is_empty() {
        println!("  no model matches");
        return;
    }
    for (i, model) in matches.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("  {marker} {}", describe_model(model));
    }
}
