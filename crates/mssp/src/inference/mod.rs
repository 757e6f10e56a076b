//! Inference: from sampled bundles to one skeleton per variable.
//!
//! - [`SkeletonDecoder`]: model token sequences → [`Skeleton`]s, one result
//!   per candidate
//! - [`CandidateSelector`]: lowest coefficient-fit error wins
//! - [`SymbolicRegressor`]: the full per-variable pipeline

mod config;
mod decoder;
mod regressor;
mod selector;

pub use config::RegressorConfig;
pub use decoder::{DecodeError, DecodeReport, Skeleton, SkeletonDecoder};
pub use regressor::{RegressorError, SymbolicRegressor, UnivariateSkeletons, VariableOutcome};
pub use selector::{CandidateSelector, SelectedSkeleton, SelectionReport, SelectorParams};
