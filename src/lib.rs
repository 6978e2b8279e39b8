//! A Rust library for model-driven extraction, validation and deduplication
//! of telecom infrastructure GeoJSON exports.

pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod models;
pub mod processor;
pub mod registry;
pub mod schema;
pub mod synth;
pub mod utils;
pub mod writer;

// Re-export the most common types for easier use
// Core types
pub use config::ProcessorConfig;
pub use error::{GeoSieveError, Result};
pub use models::{Feature, FeatureCollection, ProcessingResult, RejectReason, SkipReason};
pub use registry::{FieldExtractor, Model, ModelDetector, ModelRegistry};

// Pipeline
pub use filter::{DuplicateFilter, FeatureGate, Verdict};
pub use processor::{BatchSummary, ProcessingOrchestrator, RunReport, run_models};
pub use writer::CentralizingWriter;

// Logging
pub use utils::logging::LogContext;
