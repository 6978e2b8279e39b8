//! Feature gating and duplicate detection.

pub mod duplicate;
pub mod gate;
pub mod keys;

pub use duplicate::{DuplicateFilter, Verdict};
pub use gate::{FeatureGate, GateOutcome};
pub use keys::{FixedLength, IdentityPolicy, SignaturePolicy, StructuralIssue};
