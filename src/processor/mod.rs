//! Processing orchestrator
//!
//! Wires the pipeline per input file: decode, parse, pick the model, then for
//! each feature gate, validate and deduplicate it. Accepted features are
//! projected to the model's output shape, kept on the per-file result and
//! handed to the model's centralizing writer.
//!
//! An orchestrator either detects the model of every file or is targeted at
//! one model, in which case files that do not belong to it are skipped. In
//! detection mode the first declared match whose file-name markers accept the
//! file wins, so a case layout that is not named `CASE_*` falls through to
//! `fttb_search`. A file matched only by models whose markers reject its name
//! is skipped. Each model touched by an orchestrator gets its own duplicate
//! filter and writer; nothing is shared between orchestrators.

pub mod run;
pub mod summary;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::config::ProcessorConfig;
use crate::error::util::safe_read_file;
use crate::error::{GeoSieveError, Result};
use crate::filter::{DuplicateFilter, FeatureGate};
use crate::io::{check_file_name, decode_json};
use crate::models::feature::{Feature, FeatureCollection};
use crate::models::result::{ProcessingResult, RejectReason, SkipReason};
use crate::registry::detect::missing_required;
use crate::registry::{FieldExtractor, Model, ModelRegistry};
use crate::utils::logging::{LogContext, create_main_progress_bar, finish_progress_bar, hidden_or};
use crate::writer::{CentralizingWriter, write_collection};

pub use run::{RunReport, run_models, write_manifests};
pub use summary::{BatchSummary, FileFailure, ModelSummary};

/// Label of orchestrators that detect the model per file
pub const AUTO_LABEL: &str = "auto";

/// Per-model state owned by one orchestrator
#[derive(Debug)]
struct ModelState {
    gate: FeatureGate,
    filter: DuplicateFilter,
    writer: CentralizingWriter,
    categories: BTreeMap<String, usize>,
    log: LogContext,
}

impl ModelState {
    fn new(model: &Model, config: &ProcessorConfig, log: &LogContext) -> Self {
        let log = log.child(&model.id);
        let mut filter = DuplicateFilter::new(model.identity.clone(), model.signature.clone(), log.clone());
        filter.configure(config.enable_duplicate_detection);
        Self {
            gate: model.gate(),
            filter,
            writer: CentralizingWriter::new(
                format!("Centralized {} Data", model.title()),
                model.sort_field.clone(),
                log.clone(),
            ),
            categories: BTreeMap::new(),
            log,
        }
    }
}

/// Keeps the first `cap` issues of a file verbatim and counts the rest
struct IssueSink<'r> {
    result: &'r mut ProcessingResult,
    cap: usize,
}

impl IssueSink<'_> {
    fn reported(&self) -> usize {
        self.result.errors.len() + self.result.warnings.len()
    }

    fn warn(&mut self, message: String) {
        if self.reported() < self.cap {
            self.result.warnings.push(message);
        } else {
            self.result.suppressed_issues += 1;
        }
    }
}

/// Drives files through the pipeline
#[derive(Debug)]
pub struct ProcessingOrchestrator {
    registry: Arc<ModelRegistry>,
    config: ProcessorConfig,
    target: Option<String>,
    states: FxHashMap<String, ModelState>,
    log: LogContext,
}

impl ProcessingOrchestrator {
    /// Orchestrator detecting the model of each file
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>, config: ProcessorConfig, log: LogContext) -> Self {
        Self {
            registry,
            config,
            target: None,
            states: FxHashMap::default(),
            log,
        }
    }

    /// Orchestrator processing every file as `model_id`
    pub fn targeted(
        registry: Arc<ModelRegistry>,
        config: ProcessorConfig,
        model_id: &str,
        log: LogContext,
    ) -> Result<Self> {
        registry.require(model_id)?;
        let mut orchestrator = Self::new(registry, config, log);
        orchestrator.target = Some(model_id.to_string());
        Ok(orchestrator)
    }

    /// Target model id, `None` in detecting mode
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.target.as_deref().unwrap_or(AUTO_LABEL)
    }

    /// Process one file's bytes
    ///
    /// Never fails: decode, parse and detection problems are reported on the
    /// result, which is marked unsuccessful.
    pub fn process_one(&mut self, bytes: &[u8], file_name: &str) -> ProcessingResult {
        self.process_source(bytes, file_name, file_name)
    }

    /// Like [`Self::process_one`], with `origin` (usually the full input path)
    /// used for source-based categories
    fn process_source(&mut self, bytes: &[u8], file_name: &str, origin: &str) -> ProcessingResult {
        let start = Instant::now();
        let mut result = self.run_pipeline(bytes, file_name, origin);
        result.processing_time = start.elapsed();

        if let Some(reason) = &result.skipped {
            self.log.debug(format_args!("Skipping {reason}"));
        } else if result.success {
            self.log.info(format_args!(
                "Processed {file_name}: {} features, {} duplicates skipped, {} empty features skipped, {} invalid skipped",
                result.features_extracted,
                result.counts.duplicates_skipped,
                result.counts.empty_skipped,
                result.counts.invalid_skipped
            ));
        } else {
            self.log.error(format_args!("Error processing {file_name}: {}", result.errors.join("; ")));
        }
        result
    }

    fn failure(&self, file_name: &str, error: &GeoSieveError) -> ProcessingResult {
        let mut result = ProcessingResult::failure(file_name, error);
        result.model_detected.clone_from(&self.target);
        result
    }

    fn run_pipeline(&mut self, bytes: &[u8], file_name: &str, origin: &str) -> ProcessingResult {
        let registry = Arc::clone(&self.registry);
        let target = match self.target.as_deref().map(|id| registry.require(id)).transpose() {
            Ok(target) => target,
            Err(e) => return self.failure(file_name, &e),
        };
        if let Some(model) = target {
            if let Err(reason) = check_file_name(model, file_name) {
                return ProcessingResult::skip(file_name, reason);
            }
        }

        let (value, encoding) = match decode_json(bytes, file_name) {
            Ok(decoded) => decoded,
            Err(e) => return self.failure(file_name, &e),
        };
        let (collection, problems) = match FeatureCollection::from_value(value, file_name) {
            Ok(parsed) => parsed,
            Err(e) => return self.failure(file_name, &e),
        };

        let mut result = ProcessingResult::new(file_name);
        result.model_detected.clone_from(&self.target);
        result.metadata.insert("encoding".into(), Value::from(encoding.label()));
        {
            let mut sink = IssueSink { result: &mut result, cap: self.config.max_reported_issues };
            for problem in problems {
                sink.warn(problem);
            }
        }

        if collection.features.is_empty() {
            result.warnings.push("No features found".into());
            return result;
        }

        let observed = collection.observed_fields();
        let model = match target {
            Some(model) => {
                let missing = missing_required(model, &observed);
                if !missing.is_empty() {
                    return ProcessingResult::skip(
                        file_name,
                        SkipReason::RequiredFieldsMissing {
                            file: file_name.to_string(),
                            model: model.id.clone(),
                            missing,
                        },
                    );
                }
                model
            }
            None => {
                let mut first_skip = None;
                let candidates = registry.detector().detect_all(&observed);
                let chosen = candidates.into_iter().find(|m| match check_file_name(m, file_name) {
                    Ok(()) => true,
                    Err(reason) => {
                        first_skip.get_or_insert(reason);
                        false
                    }
                });
                match (chosen, first_skip) {
                    (Some(model), _) => model,
                    (None, Some(reason)) => return ProcessingResult::skip(file_name, reason),
                    (None, None) => {
                        let error = GeoSieveError::ModelDetection {
                            file: file_name.to_string(),
                            observed_fields: observed.iter().map(|f| f.to_uppercase()).collect(),
                        };
                        return self.failure(file_name, &error);
                    }
                }
            }
        };
        result.model_detected = Some(model.id.clone());

        let state = self
            .states
            .entry(model.id.clone())
            .or_insert_with(|| ModelState::new(model, &self.config, &self.log));
        process_features(model, state, &self.config, collection.features, file_name, origin, &mut result);

        result.metadata.insert("total_features".into(), Value::from(result.features_processed));
        result.metadata.insert("filtered_features".into(), Value::from(result.features_extracted));
        result
            .metadata
            .insert("duplicates_skipped".into(), Value::from(result.counts.duplicates_skipped));
        result
            .metadata
            .insert("empty_features_skipped".into(), Value::from(result.counts.empty_skipped));
        result
            .metadata
            .insert("processing_timestamp".into(), Value::from(result.timestamp.to_rfc3339()));
        result
    }

    /// Read and process a file, writing its per-file output under `out_dir`
    pub fn process_file(&mut self, path: &Path, out_dir: Option<&Path>) -> ProcessingResult {
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let bytes = match safe_read_file(path, "GeoJSON input") {
            Ok(bytes) => bytes,
            Err(e) => return self.failure(&file_name, &e),
        };
        let mut result = self.process_source(&bytes, &file_name, &path.display().to_string());
        result
            .metadata
            .insert("source_file".into(), Value::from(path.display().to_string()));

        if let Some(out_dir) = out_dir {
            if let Err(e) = self.write_per_file(path, out_dir, &mut result) {
                result.success = false;
                result.errors.push(e.to_string());
            }
        }
        result
    }

    fn write_per_file(&self, path: &Path, out_dir: &Path, result: &mut ProcessingResult) -> Result<()> {
        if !self.config.write_per_file || !result.success || result.features.is_empty() {
            return Ok(());
        }
        let Some(model) = result.model_detected.as_deref().and_then(|id| self.registry.get(id)) else {
            return Ok(());
        };
        if !model.output.per_file {
            return Ok(());
        }

        let stem = path
            .file_stem()
            .map_or_else(|| result.file.clone(), |s| s.to_string_lossy().into_owned());
        let output = out_dir.join(model.output_directory()).join(format!("{stem}.geojson"));
        write_collection(&output, &format!("Processed {} - {stem}", model.title()), &result.features)?;
        result
            .metadata
            .insert("output_file".into(), Value::from(output.display().to_string()));
        Ok(())
    }

    /// Process every file and, with an output directory, write the results
    pub fn process_batch(&mut self, files: &[PathBuf], out_dir: Option<&Path>) -> BatchSummary {
        let pb = hidden_or(self.config.show_progress, || {
            create_main_progress_bar(files.len() as u64, Some(self.label()))
        });
        let summary = self.process_batch_with(files, out_dir, &pb);
        finish_progress_bar(&pb, Some("done"));
        summary
    }

    /// [`Self::process_batch`] reporting to an existing progress bar
    pub fn process_batch_with(
        &mut self,
        files: &[PathBuf],
        out_dir: Option<&Path>,
        pb: &ProgressBar,
    ) -> BatchSummary {
        let start = Instant::now();
        let mut summary = BatchSummary::new(self.label());
        pb.set_length(files.len() as u64);

        for path in files {
            let result = self.process_file(path, out_dir);
            summary.record(&result);
            pb.inc(1);
        }

        if let Some(out_dir) = out_dir {
            match self.finish(out_dir) {
                Ok(outputs) => summary.outputs = outputs,
                Err(e) => {
                    self.log.error(format_args!("Failed to write centralized output: {e}"));
                    summary.run_errors.push(e.to_string());
                }
            }
        }

        summary.models = self.summaries();
        summary.elapsed = start.elapsed();
        summary
    }

    /// Write the centralized file of every model that accumulated features
    pub fn finish(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if !self.config.write_centralized {
            return Ok(written);
        }
        for model in self.touched_models() {
            if !model.output.centralized {
                continue;
            }
            let Some(state) = self.states.get(&model.id) else { continue };
            let path = centralized_path(out_dir, model);
            if let Some(path) = state.writer.flush(&path)? {
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Models that processed at least one file, in declaration order
    #[must_use]
    pub fn touched_models(&self) -> Vec<&Model> {
        self.registry
            .all()
            .filter(|m| self.states.contains_key(&m.id))
            .collect()
    }

    /// Per-model summaries, in declaration order
    #[must_use]
    pub fn summaries(&self) -> Vec<ModelSummary> {
        self.touched_models()
            .into_iter()
            .filter_map(|model| {
                let state = self.states.get(&model.id)?;
                Some(ModelSummary {
                    model_type: model.id.clone(),
                    total_features: state.writer.len(),
                    duplicate_stats: state.filter.stats().clone(),
                    files_processed: state.writer.source_file_count(),
                    unique_primary_keys: state.filter.unique_primary_keys(),
                    categories: state.categories.clone(),
                })
            })
            .collect()
    }

    /// Centralizing writer of a model, once it has seen a file
    #[must_use]
    pub fn writer(&self, model_id: &str) -> Option<&CentralizingWriter> {
        self.states.get(model_id).map(|s| &s.writer)
    }

    /// Duplicate counters of a model, once it has seen a file
    #[must_use]
    pub fn duplicate_stats(&self, model_id: &str) -> Option<&crate::models::DuplicateStats> {
        self.states.get(model_id).map(|s| s.filter.stats())
    }
}

/// Location of a model's centralized file
#[must_use]
pub fn centralized_path(out_dir: &Path, model: &Model) -> PathBuf {
    out_dir
        .join(model.output_directory())
        .join(format!("{}_centralized.geojson", model.id))
}

fn process_features(
    model: &Model,
    state: &mut ModelState,
    config: &ProcessorConfig,
    features: Vec<Feature>,
    file_name: &str,
    origin: &str,
    result: &mut ProcessingResult,
) {
    let extractor = FieldExtractor::new(model);
    let timestamp = result.timestamp;
    let mut rejections = Vec::new();
    let mut accepted = Vec::new();
    let mut sink = IssueSink { result, cap: config.max_reported_issues };

    for (index, feature) in features.into_iter().enumerate() {
        if let Some(reason) = state.gate.check(&feature.properties).into_rejection() {
            rejections.push((index, reason));
            continue;
        }

        if config.enable_validation {
            let outcome = extractor.validate(&feature.properties);
            for warning in outcome.warnings {
                sink.warn(format!("Feature {index}: {warning}"));
            }
            if !outcome.is_valid {
                if config.strict_mode {
                    rejections.push((index, RejectReason::Validation { errors: outcome.errors }));
                    continue;
                }
                for error in outcome.errors {
                    sink.warn(format!("Feature {index}: {error}"));
                }
            }
        }

        if let Some(reason) = state.filter.accept(&feature, file_name).into_rejection() {
            rejections.push((index, reason));
            continue;
        }

        if let Some(rule) = &model.categories {
            let label = rule.classify(&feature.properties, origin);
            *state.categories.entry(label.to_string()).or_insert(0) += 1;
        }
        let projected = Feature {
            kind: feature.kind,
            properties: extractor.extract(&feature.properties),
            geometry: feature.geometry,
        };
        state.writer.add(projected.clone(), file_name, timestamp);
        accepted.push(projected);
    }

    let result = sink.result;
    result.features_processed = accepted.len() + rejections.len();
    result.features_extracted = accepted.len();
    result.counts.seen = result.features_processed;
    result.counts.extracted = accepted.len();
    result.features = accepted;
    for (index, reason) in rejections {
        state.log.debug(format_args!("{file_name}: feature {index} skipped, {reason}"));
        result.reject(index, reason);
    }
}
