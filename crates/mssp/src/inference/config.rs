//! Configuration of the symbolic regressor.
//!
//! # Example
//!
//! ```
//! use mssp::inference::{RegressorConfig, SelectorParams};
//! use mssp::sampling::SamplerParams;
//!
//! let config = RegressorConfig::builder()
//!     .sampler(SamplerParams { n_sets: 4, n_samples: 500, ..Default::default() })
//!     .selector(SelectorParams { max_iterations: 50, ..Default::default() })
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.sampler.n_sets, 4);
//! ```

use bon::Builder;

use super::selector::SelectorParams;
use crate::config::ConfigError;
use crate::context::ExecutionContext;
use crate::normalize::NormalizerParams;
use crate::sampling::SamplerParams;
use crate::training::Verbosity;

/// Configuration for [`SymbolicRegressor`](super::SymbolicRegressor).
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct RegressorConfig {
    // === Pipeline stages ===
    /// Variable-isolation sampling.
    #[builder(default)]
    pub sampler: SamplerParams,

    /// Set normalization.
    #[builder(default)]
    pub normalizer: NormalizerParams,

    /// Coefficient-fit candidate selection.
    #[builder(default)]
    pub selector: SelectorParams,

    // === Resources ===
    /// Device handed to the surrogate and the sequence model.
    #[builder(default)]
    pub context: ExecutionContext,

    // === Reproducibility ===
    /// Random seed. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: regressor_config_builder::IsComplete> RegressorConfigBuilder<S> {
    /// Build and validate the configuration.
    pub fn build(self) -> Result<RegressorConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl RegressorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.sampler.validate()?;
        self.normalizer.validate()?;
        self.selector.validate()?;
        Ok(())
    }
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RegressorConfig::default();
        assert_eq!(config.sampler.n_sets, 10);
        assert_eq!(config.sampler.candidate_rank, 3);
        assert_eq!(config.selector.coefficient_bounds, (-20.0, 20.0));
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn invalid_group_rejected() {
        let result = RegressorConfig::builder()
            .sampler(SamplerParams {
                n_retries: 0,
                ..Default::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCount {
                field: "n_retries",
                ..
            })
        ));
    }
}
