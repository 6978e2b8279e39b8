//! Output GeoJSON writers.

pub mod centralized;
pub mod compact;

pub use centralized::{CentralizedEntry, CentralizingWriter};
pub use compact::{render_collection, render_feature, upper_case_keys, write_collection};
