//! The skeleton-model training loop.
//!
//! Epoch → shuffled blocks → curate → shuffled mini-batches → forward,
//! masked loss, optimize. After each epoch the model is validated on the
//! validation blocks (same curation, no optimizer step) and checkpointed
//! when the validation loss improves on the best seen so far. The first
//! epoch is always checkpointed.

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::batch::mini_batches;
use super::callback::{EarlyStopAction, EarlyStopping};
use super::config::TrainerConfig;
use super::curate::{BatchCurator, CuratedBlock};
use super::eval::{LossAccumulator, MetricValue};
use super::logger::TrainingLogger;
use super::loss::{sequence_loss, LossError};
use crate::data::{list_blocks, read_block, BlockIoError};
use crate::model::{ModelError, ModelMode, SequenceModel};

/// Offset separating validation RNG streams from training ones.
const VALIDATION_STREAM: u64 = 0x5B5A_AAAA;

// =============================================================================
// Errors and report
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("no training blocks in {0}")]
    NoTrainingBlocks(PathBuf),

    #[error(transparent)]
    Block(#[from] BlockIoError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Loss(#[from] LossError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-epoch summary.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    /// Mean training loss over the epoch's mini-batches.
    pub train_loss: Option<f64>,
    /// Mean per-sample validation loss.
    pub validation_loss: Option<f64>,
    pub n_batches: usize,
    /// Training records rejected by curation.
    pub n_rejected: usize,
    /// Whether a checkpoint was written after this epoch.
    pub checkpointed: bool,
}

/// Outcome of [`SkeletonTrainer::fit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epochs: Vec<EpochSummary>,
    pub best_validation_loss: Option<f64>,
    pub stopped_early: bool,
}

// =============================================================================
// SkeletonTrainer
// =============================================================================

/// Trains a [`SequenceModel`] on stored sample blocks.
pub struct SkeletonTrainer<M> {
    config: TrainerConfig,
    model: M,
    curator: BatchCurator,
}

impl<M: SequenceModel> SkeletonTrainer<M> {
    pub fn new(config: TrainerConfig, model: M) -> Self {
        let curator = BatchCurator::new(config.curator.clone(), config.parallelism);
        Self {
            config,
            model,
            curator,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Train on the `*.json` blocks of `train_dir`, validating on those of
    /// `validation_dir`.
    pub fn fit(&mut self, train_dir: &Path, validation_dir: &Path) -> Result<TrainingReport, TrainError> {
        let train_files = list_blocks(train_dir)?;
        if train_files.is_empty() {
            return Err(TrainError::NoTrainingBlocks(train_dir.to_path_buf()));
        }
        let val_files = list_blocks(validation_dir)?;
        fs::create_dir_all(&self.config.checkpoint_dir).map_err(|source| TrainError::Io {
            path: self.config.checkpoint_dir.clone(),
            source,
        })?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..train_files.len()).collect();
        let mut early_stopping = EarlyStopping::new(self.config.early_stopping_patience, false);
        let mut logger = TrainingLogger::new(self.config.verbosity);
        let mut report = TrainingReport::default();

        logger.start_training(self.config.epochs);
        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);

            let mut epoch_loss = LossAccumulator::new();
            let mut running = 0.0;
            let mut n_batches = 0usize;
            let mut n_rejected = 0usize;

            for &block_idx in &order {
                let records = read_block(&train_files[block_idx])?;
                let block = self.curator.curate_block(&records, self.config.seed, epoch, block_idx);
                n_rejected += block.rejected.len();
                for (i, reason) in &block.rejected {
                    logger.debug(format_args!(
                        "{}: record {} rejected: {}",
                        train_files[block_idx].display(),
                        i,
                        reason
                    ));
                }
                if block.is_empty() {
                    continue;
                }

                self.model.set_mode(ModelMode::Train);
                let mut sample_order: Vec<usize> = (0..block.len()).collect();
                sample_order.shuffle(&mut rng);

                for batch in mini_batches(&block, &sample_order, self.config.batch_size) {
                    let output = self
                        .model
                        .forward(&self.config.context, batch.inputs.view(), batch.targets.view())?;
                    let loss = sequence_loss(output.logits.view(), batch.targets.view())?
                        + output.aux_loss.unwrap_or(0.0);
                    self.model.optimize(loss)?;

                    n_batches += 1;
                    running += loss;
                    epoch_loss.add(loss, 1);
                    if n_batches % self.config.log_interval == 0 {
                        logger.log_running_loss(epoch, n_batches, running / self.config.log_interval as f64);
                        running = 0.0;
                    }
                }
            }

            let mut checkpointed = false;
            if epoch == 0 {
                self.save_checkpoint(&logger)?;
                checkpointed = true;
            }

            let validation_loss = self.validate(&val_files, epoch)?;
            let mut metrics = Vec::with_capacity(2);
            if let Some(l) = epoch_loss.mean() {
                metrics.push(MetricValue::loss("train-loss", l));
            }
            let mut stop = false;
            if let Some(loss) = validation_loss {
                metrics.push(MetricValue::loss("valid-loss", loss));
                match early_stopping.update(loss) {
                    EarlyStopAction::Improved => {
                        self.save_checkpoint(&logger)?;
                        checkpointed = true;
                    }
                    EarlyStopAction::Continue => {}
                    EarlyStopAction::Stop => stop = true,
                }
                self.write_validation_file(loss)?;
            }
            logger.log_metrics(epoch, &metrics);

            report.epochs.push(EpochSummary {
                epoch,
                train_loss: epoch_loss.mean(),
                validation_loss,
                n_batches,
                n_rejected,
                checkpointed,
            });
            if stop {
                logger.log_early_stopping(epoch, early_stopping.best_round(), "valid-loss");
                report.stopped_early = true;
                break;
            }
        }
        logger.finish_training();

        report.best_validation_loss = early_stopping.best_value();
        Ok(report)
    }

    /// Mean per-sample validation loss, or `None` without validation samples.
    ///
    /// The validation file is rewritten with the running loss after every
    /// block.
    fn validate(&mut self, files: &[PathBuf], epoch: usize) -> Result<Option<f64>, TrainError> {
        self.model.set_mode(ModelMode::Eval);
        let mut acc = LossAccumulator::new();
        for (block_idx, path) in files.iter().enumerate() {
            let records = read_block(path)?;
            let block: CuratedBlock = self.curator.curate_block(
                &records,
                self.config.seed ^ VALIDATION_STREAM,
                epoch,
                block_idx,
            );
            let order: Vec<usize> = (0..block.len()).collect();
            for batch in mini_batches(&block, &order, self.config.validation_batch_size) {
                let output = self
                    .model
                    .forward(&self.config.context, batch.inputs.view(), batch.targets.view())?;
                let loss = sequence_loss(output.logits.view(), batch.targets.view())?;
                acc.add(loss * batch.len() as f64, batch.len());
            }
            if let Some(running) = acc.mean() {
                self.write_validation_file(running)?;
            }
        }
        Ok(acc.mean())
    }

    fn save_checkpoint(&self, logger: &TrainingLogger) -> Result<(), TrainError> {
        let path = self.config.checkpoint_path();
        self.model.save(&path)?;
        logger.log_checkpoint(&path);
        Ok(())
    }

    fn write_validation_file(&self, loss: f64) -> Result<(), TrainError> {
        let path = self.config.validation_path();
        fs::write(&path, loss.to_string()).map_err(|source| TrainError::Io { path, source })
    }
}
