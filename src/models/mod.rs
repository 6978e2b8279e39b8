//! Data types flowing through the pipeline.

pub mod feature;
pub mod result;

pub use feature::{Feature, FeatureCollection, default_geometry, is_populated, value_text};
pub use result::{
    DuplicateStats, FeatureCounts, ProcessingResult, RejectReason, Rejection, SkipReason,
};
