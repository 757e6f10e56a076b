//! Data model: variables, problems, sample sets, bundles and stored blocks.
//!
//! - [`Variable`] / [`VariableKind`]: one input dimension with its range
//! - [`Problem`]: the observed dataset and its variables
//! - [`SampleSet`]: one (x, y) draw isolating a single variable
//! - [`SetBundle`]: `S` sample sets for the same variable and sample count
//! - [`SampleRecord`] / [`BlockWriter`]: pre-sampled training records on disk

mod block;
mod bundle;
mod problem;
mod sample_set;
mod variable;

pub use block::{list_blocks, read_block, write_block, BlockIoError, BlockWriter, SampleBlock, SampleRecord};
pub use bundle::{BundleError, SetBundle};
pub use problem::{Problem, ProblemError};
pub use sample_set::SampleSet;
pub use variable::{Variable, VariableKind};
