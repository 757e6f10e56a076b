//! mssp: multi-set skeleton prediction for symbolic regression.
//!
//! Recovers, for each input variable of a black-box function, the univariate
//! functional form ("skeleton") in which that variable appears. A surrogate
//! model is probed with sample sets that vary one variable at a time, the sets
//! are normalized and handed to a pretrained sequence model, and its candidate
//! token sequences are decoded and ranked by how well their fitted
//! coefficients explain the data.
//!
//! # Key Types
//!
//! - [`SymbolicRegressor`] / [`RegressorConfig`] - The per-variable inference pipeline
//! - [`DomainSampler`] - Variable-isolation sampling from a [`Surrogate`]
//! - [`SetNormalizer`] - Set standardization and tensor assembly
//! - [`SkeletonDecoder`] / [`Vocabulary`] - Token sequences to expressions
//! - [`GeneticFitter`] - Coefficient fitting for skeleton selection
//! - [`SkeletonTrainer`] / [`TrainerConfig`] - Training on stored sample blocks
//!
//! The sequence model itself is a collaborator behind [`SequenceModel`].

// Re-export approx traits for users who want to compare fitted values
pub use approx;

pub mod config;
pub mod context;
pub mod data;
pub mod expr;
pub mod fit;
pub mod inference;
pub mod model;
pub mod normalize;
pub mod sampling;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Pipeline
pub use inference::{RegressorConfig, SymbolicRegressor, UnivariateSkeletons};
pub use sampling::{DomainSampler, FnSurrogate, Surrogate};
pub use normalize::SetNormalizer;
pub use inference::SkeletonDecoder;
pub use fit::{CoefficientFitter, GeneticFitter};

// Model capability
pub use model::{ModelError, ScoredSequence, SequenceModel};

// Data and expressions
pub use data::{Problem, Variable, VariableKind};
pub use expr::{Expr, Vocabulary};

// Training
pub use training::{SkeletonTrainer, TrainerConfig};

// Shared
pub use config::ConfigError;
pub use context::{Device, ExecutionContext};
pub use utils::Parallelism;
