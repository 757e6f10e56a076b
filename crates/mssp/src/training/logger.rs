//! Structured progress logging with verbosity levels.
//!
//! [`TrainingLogger`] is owned by a long-running loop (the trainer epoch loop,
//! the regressor's per-variable loop) and forwards messages to the [`log`]
//! facade when the configured [`Verbosity`] allows it. The host binary picks
//! the logging backend.

use std::fmt::Display;
use std::path::Path;
use std::time::Instant;

use super::eval::MetricValue;

/// Verbosity level for training and inference output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Errors and warnings only.
    Warning,
    /// Progress and important information.
    Info,
    /// Detailed debugging information.
    Debug,
}

/// Progress logger gated by [`Verbosity`].
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    n_rounds: usize,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            n_rounds: 0,
            started: None,
        }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    pub fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    /// Mark the start of a loop over `n_rounds` epochs (or variables).
    pub fn start_training(&mut self, n_rounds: usize) {
        self.n_rounds = n_rounds;
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            log::info!("starting: {} rounds", n_rounds);
        }
    }

    /// Log the metrics computed at the end of a round.
    pub fn log_metrics(&self, round: usize, metrics: &[MetricValue]) {
        if !self.enabled(Verbosity::Info) || metrics.is_empty() {
            return;
        }
        let rendered: Vec<String> = metrics.iter().map(ToString::to_string).collect();
        log::info!("[{}/{}] {}", round + 1, self.n_rounds, rendered.join("  "));
    }

    /// Log the running loss inside a round (every few mini-batches).
    pub fn log_running_loss(&self, round: usize, batch: usize, loss: f64) {
        if self.enabled(Verbosity::Info) {
            log::info!("[{}, {:5}] loss: {:.5}", round + 1, batch, loss);
        }
    }

    pub fn log_early_stopping(&self, round: usize, best_round: usize, metric_name: &str) {
        if self.enabled(Verbosity::Info) {
            log::info!(
                "early stopping at round {}: best {} at round {}",
                round + 1,
                metric_name,
                best_round + 1
            );
        }
    }

    pub fn log_checkpoint(&self, path: &Path) {
        if self.enabled(Verbosity::Info) {
            log::info!("checkpoint saved to {}", path.display());
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.enabled(Verbosity::Info) {
            log::info!("{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.enabled(Verbosity::Warning) {
            log::warn!("{}", message);
        }
    }

    pub fn debug(&self, message: impl Display) {
        if self.enabled(Verbosity::Debug) {
            log::debug!("{}", message);
        }
    }

    pub fn finish_training(&self) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        match self.started {
            Some(t) => log::info!("finished in {:.2?}", t.elapsed()),
            None => log::info!("finished"),
        }
    }
}
