//! Explicit logging context handed to pipeline components.
//!
//! The `log` facade is still the sink. What a context adds is a per-run target
//! and label, so every line a component emits can be attributed to the batch
//! run (and model) that produced it without any process-wide logger state.

use std::fmt::Display;
use std::sync::Arc;

use log::Level;

/// Target and label for one batch run
#[derive(Debug, Clone)]
pub struct LogContext {
    target: Arc<str>,
    label: Arc<str>,
}

impl LogContext {
    /// Create a context logging under `target` with lines prefixed by `label`
    #[must_use]
    pub fn new(target: &str, label: &str) -> Self {
        Self {
            target: Arc::from(target),
            label: Arc::from(label),
        }
    }

    /// Context for a model run inside this one; shares the target
    #[must_use]
    pub fn child(&self, label: &str) -> Self {
        Self {
            target: Arc::clone(&self.target),
            label: Arc::from(format!("{}/{label}", self.label)),
        }
    }

    /// Log target
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a message at `level` would be emitted
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        let target: &str = &self.target;
        log::log_enabled!(target: target, level)
    }

    fn emit(&self, level: Level, message: impl Display) {
        let target: &str = &self.target;
        log::log!(target: target, level, "[{}] {message}", self.label);
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(Level::Error, message);
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new("geo_sieve", "run")
    }
}
