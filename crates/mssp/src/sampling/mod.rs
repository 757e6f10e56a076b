//! Variable-isolation sampling from a surrogate oracle.
//!
//! For a target variable, the [`DomainSampler`] draws `S` sample sets in which
//! only that variable varies. Each set is picked among several candidate
//! draws by rank of its linear-fit R², steering away from near-linear and
//! flat responses.

mod sampler;
mod surrogate;

pub use sampler::{DomainSampler, SampledVariable, SamplerParams, SamplingError};
pub use surrogate::{evaluate_batched, FnSurrogate, Surrogate, SurrogateError};
