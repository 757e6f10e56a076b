//! Trainer configuration.
//!
//! # Example
//!
//! ```
//! use mssp::training::{CuratorParams, TrainerConfig};
//!
//! let config = TrainerConfig::builder()
//!     .dataset("feynman")
//!     .epochs(3)
//!     .batch_size(8)
//!     .curator(CuratorParams { block_size: 200, n_sets: 4, ..Default::default() })
//!     .early_stopping_patience(2)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.checkpoint_path().file_name().unwrap(), "Model-feynman");
//! ```

use std::path::PathBuf;

use bon::Builder;

use super::curate::CuratorParams;
use super::logger::Verbosity;
use crate::config::{check_count, ConfigError};
use crate::context::ExecutionContext;
use crate::utils::Parallelism;

/// Name of the validation-loss file inside the checkpoint directory.
pub const VALIDATION_FILE: &str = "validation_performance.txt";

/// Configuration for [`SkeletonTrainer`](super::SkeletonTrainer).
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct TrainerConfig {
    // === Identity ===
    /// Dataset name; the checkpoint is stored as `Model-{dataset}`.
    #[builder(into)]
    pub dataset: String,

    // === Loop ===
    /// Number of epochs. Default: 10.
    #[builder(default = 10)]
    pub epochs: usize,

    /// Training mini-batch size. Default: 16.
    #[builder(default = 16)]
    pub batch_size: usize,

    /// Validation mini-batch size. Default: 1.
    #[builder(default = 1)]
    pub validation_batch_size: usize,

    /// Log the running training loss every this many mini-batches. Default: 5.
    #[builder(default = 5)]
    pub log_interval: usize,

    // === Data ===
    /// Record curation.
    #[builder(default)]
    pub curator: CuratorParams,

    // === Outputs ===
    /// Directory for the checkpoint and the validation file. Default: `saved_models`.
    #[builder(default = PathBuf::from("saved_models"), into)]
    pub checkpoint_dir: PathBuf,

    // === Early stopping ===
    /// Stop after this many epochs without validation improvement.
    /// `None` trains for every epoch.
    pub early_stopping_patience: Option<usize>,

    // === Resources ===
    #[builder(default)]
    pub context: ExecutionContext,

    /// Curate the records of a block in parallel. Default: sequential.
    #[builder(default)]
    pub parallelism: Parallelism,

    // === Reproducibility ===
    /// Random seed. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Logging ===
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: trainer_config_builder::IsComplete> TrainerConfigBuilder<S> {
    /// Build and validate the configuration.
    pub fn build(self) -> Result<TrainerConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl TrainerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.is_empty() {
            return Err(ConfigError::Empty { field: "dataset" });
        }
        check_count("epochs", self.epochs, 1)?;
        check_count("batch_size", self.batch_size, 1)?;
        check_count("validation_batch_size", self.validation_batch_size, 1)?;
        check_count("log_interval", self.log_interval, 1)?;
        self.curator.validate()?;
        Ok(())
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join(format!("Model-{}", self.dataset))
    }

    pub fn validation_path(&self) -> PathBuf {
        self.checkpoint_dir.join(VALIDATION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrainerConfig::builder().dataset("d").build().unwrap();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.validation_batch_size, 1);
        assert_eq!(config.log_interval, 5);
        assert_eq!(config.curator.collapse_probability, 0.3);
        assert_eq!(config.validation_path(), PathBuf::from("saved_models").join(VALIDATION_FILE));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            TrainerConfig::builder().dataset("").build(),
            Err(ConfigError::Empty { field: "dataset" })
        ));
        assert!(matches!(
            TrainerConfig::builder().dataset("d").batch_size(0).build(),
            Err(ConfigError::InvalidCount { field: "batch_size", .. })
        ));
    }
}
