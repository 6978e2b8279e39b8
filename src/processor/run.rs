//! Multi-model runs.
//!
//! Every selected model gets its own targeted orchestrator over the same
//! input files. The orchestrators share nothing, so they run side by side on
//! a rayon pool. Manifests are written afterwards, once per output directory,
//! since several models may write into the same one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressDrawTarget;
use itertools::Itertools;
use log::info;
use rayon::prelude::*;
use serde::Serialize;

use super::{BatchSummary, ProcessingOrchestrator};
use crate::config::ProcessorConfig;
use crate::error::{GeoSieveError, Result};
use crate::io::write_manifest;
use crate::registry::{Model, ModelRegistry};
use crate::utils::logging::{
    LogContext, add_group_progress_bar, create_multi_progress, finish_progress_bar, hidden_or,
};

/// Outcome of [`run_models`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// One summary per model, in the order the models were requested
    pub summaries: Vec<BatchSummary>,
    pub manifests: Vec<PathBuf>,
    /// Manifest directories that could not be listed or written
    pub manifest_errors: Vec<String>,
}

impl RunReport {
    /// True when every model run succeeded and every manifest was written
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.manifest_errors.is_empty() && self.summaries.iter().all(BatchSummary::is_success)
    }
}

/// Run `model_ids` (all models when empty) over `files`, writing under `out_dir`
///
/// # Arguments
/// * `registry` - Model catalogue shared by the runs
/// * `model_ids` - Models to run, in reporting order
/// * `files` - Input files, usually from [`crate::io::find_geojson_files`]
/// * `out_dir` - Root of the outputs; each model writes into its directory
/// * `config` - Settings applied to every model run
/// * `log` - Parent context, each run logs under a child named after its model
///
/// # Errors
/// Fails before processing when a model id is unknown or the worker pool
/// cannot be built. File and model failures are reported in the summaries.
pub fn run_models(
    registry: Arc<ModelRegistry>,
    model_ids: &[String],
    files: &[PathBuf],
    out_dir: &Path,
    config: &ProcessorConfig,
    log: &LogContext,
) -> Result<RunReport> {
    let ids: Vec<String> = if model_ids.is_empty() {
        registry.ids().map(str::to_string).collect()
    } else {
        for id in model_ids {
            registry.require(id)?;
        }
        model_ids.iter().unique().cloned().collect()
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_workers.max(1))
        .build()
        .map_err(|e| GeoSieveError::configuration(format!("Cannot build worker pool: {e}")))?;

    let start = Instant::now();
    log.info(format_args!(
        "Processing {} files with {} models on {} workers",
        files.len(),
        ids.len(),
        pool.current_num_threads()
    ));

    let (mp, main_pb) = create_multi_progress(ids.len() as u64, Some("models"));
    if !config.show_progress {
        mp.set_draw_target(ProgressDrawTarget::hidden());
    }

    let summaries: Vec<BatchSummary> = pool.install(|| {
        ids.par_iter()
            .map(|id| {
                let mut orchestrator =
                    ProcessingOrchestrator::targeted(Arc::clone(&registry), config.clone(), id, log.child(id))?;
                let pb = hidden_or(config.show_progress, || {
                    add_group_progress_bar(&mp, files.len() as u64, Some(id))
                });
                let summary = orchestrator.process_batch_with(files, Some(out_dir), &pb);
                finish_progress_bar(&pb, Some(&format!("{id} done")));
                main_pb.inc(1);
                Ok(summary)
            })
            .collect::<Result<Vec<_>>>()
    })?;
    finish_progress_bar(&main_pb, Some("All models processed"));

    let mut report = RunReport {
        summaries,
        ..RunReport::default()
    };

    if config.write_manifest {
        let models: Vec<&Model> = ids.iter().filter_map(|id| registry.get(id)).collect();
        let (manifests, errors) = write_manifests(out_dir, &models);
        report.manifests = manifests;
        report.manifest_errors = errors;
    }

    info!(
        "Run finished in {:.2?}: {} models, {} manifests",
        start.elapsed(),
        report.summaries.len(),
        report.manifests.len()
    );
    Ok(report)
}

/// Write one manifest per distinct output directory of `models`
///
/// Priority names of models sharing a directory are merged in model order.
/// Returns the written manifests and a message per directory that failed.
pub fn write_manifests(out_dir: &Path, models: &[&Model]) -> (Vec<PathBuf>, Vec<String>) {
    let groups = models
        .iter()
        .map(|m| (m.output_directory(), &m.output.manifest_priority))
        .into_group_map();

    let mut written = Vec::new();
    let mut errors = Vec::new();
    for dir in models.iter().map(|m| m.output_directory()).unique() {
        let priority: Vec<String> = groups
            .get(dir)
            .into_iter()
            .flatten()
            .flat_map(|names| names.iter().cloned())
            .unique()
            .collect();
        let path = out_dir.join(dir);
        match write_manifest(&path, &format!("data/{dir}"), &priority) {
            Ok(Some(manifest)) => written.push(manifest),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Manifest for {} failed: {e}", path.display());
                errors.push(format!("{}: {e}", path.display()));
            }
        }
    }
    (written, errors)
}
