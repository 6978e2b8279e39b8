//! Shared utilities: logging helpers, console output and progress bars.

pub mod logging;
