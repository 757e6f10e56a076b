//! Training infrastructure for the skeleton model.
//!
//! ## Curation
//!
//! - [`sample_domain`]: random symmetric X window refilled to `block_size` rows
//! - [`BatchCurator`]: windowing, shuffling, validation and normalization of
//!   stored records, with a [`RejectReason`] per excluded record
//! - [`MiniBatch`] / [`pad_sequences`]: rectangular, zero-padded targets
//!
//! ## Loop
//!
//! - [`SkeletonTrainer`] / [`TrainerConfig`]: epochs, validation, checkpoints
//! - [`sequence_loss`] / [`masked_cross_entropy`]: padding-aware loss
//! - [`EarlyStopping`]: best validation tracking with optional patience
//! - [`TrainingLogger`], [`Verbosity`]: structured logging

mod batch;
mod callback;
mod config;
mod curate;
mod eval;
mod logger;
mod loss;
mod trainer;
mod window;

pub use batch::{mini_batches, pad_sequences, MiniBatch, PAD_TOKEN};
pub use callback::{EarlyStopAction, EarlyStopping};
pub use config::{TrainerConfig, VALIDATION_FILE};
pub use curate::{record_seed, BatchCurator, CuratedBlock, CuratedSample, CuratorParams, RejectReason};
pub use eval::{LossAccumulator, MetricValue};
pub use logger::{TrainingLogger, Verbosity};
pub use loss::{masked_cross_entropy, sequence_loss, LossError};
pub use trainer::{EpochSummary, SkeletonTrainer, TrainError, TrainingReport};
pub use window::{sample_domain, DomainWindow, WindowExhausted};
