//! Test helpers: synthetic problems and records, and mock sequence models.
//!
//! Used by the unit tests, the integration tests and doc examples. Everything
//! here is deterministic for a given seed.

mod data;
mod models;

pub use data::{random_problem, synthetic_record, write_synthetic_blocks};
pub use models::{LearningModel, ScriptedModel};
