//! Set normalization and tensor assembly.
//!
//! - [`SetNormalizer`]: per-set Y standardization and bundle-wide X rescaling
//! - [`assemble_input`] / [`assemble_batch`]: pack sets into the
//!   `(batch, samples, 2, sets)` layout consumed by the sequence model,
//!   channel 0 holding X and channel 1 holding Y

mod assemble;
mod normalizer;

pub use assemble::{assemble_batch, assemble_input, BundleTensor, CHANNEL_X, CHANNEL_Y};
pub use normalizer::{
    rescale_x, standardize_columns, NormalizeError, NormalizedBundle, NormalizerParams,
    SetHealth, SetNormalizer,
};
