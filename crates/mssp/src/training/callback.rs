//! Best-model tracking and early stopping on the validation loss.
//!
//! The trainer checkpoints whenever [`EarlyStopping::update`] reports
//! [`EarlyStopAction::Improved`]; the stop signal is only raised when a
//! patience is configured.

/// Outcome of feeding one validation value to [`EarlyStopping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyStopAction {
    /// New best value observed.
    Improved,
    /// No improvement, keep going.
    Continue,
    /// `patience` consecutive rounds without improvement.
    Stop,
}

/// Early stopping configuration and state.
///
/// # Example
///
/// ```
/// use mssp::training::{EarlyStopAction, EarlyStopping};
///
/// let mut early_stop = EarlyStopping::new(Some(2), false);
/// assert_eq!(early_stop.update(1.0), EarlyStopAction::Improved);
/// assert_eq!(early_stop.update(1.5), EarlyStopAction::Continue);
/// assert_eq!(early_stop.update(1.2), EarlyStopAction::Stop);
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    /// Rounds without improvement before stopping. `None` never stops.
    patience: Option<usize>,
    best_value: Option<f64>,
    best_round: usize,
    current_round: usize,
    higher_is_better: bool,
}

impl EarlyStopping {
    pub fn new(patience: Option<usize>, higher_is_better: bool) -> Self {
        Self {
            patience,
            best_value: None,
            best_round: 0,
            current_round: 0,
            higher_is_better,
        }
    }

    /// Returns true if a patience is configured.
    pub fn is_enabled(&self) -> bool {
        self.patience.is_some()
    }

    /// Feed the value for the current round.
    ///
    /// Non-finite values never count as an improvement.
    pub fn update(&mut self, value: f64) -> EarlyStopAction {
        let is_improvement = value.is_finite()
            && match self.best_value {
                None => true,
                Some(best) if self.higher_is_better => value > best,
                Some(best) => value < best,
            };

        let round = self.current_round;
        self.current_round += 1;

        if is_improvement {
            self.best_value = Some(value);
            self.best_round = round;
            return EarlyStopAction::Improved;
        }

        match self.patience {
            Some(p) if self.current_round - self.best_round > p => EarlyStopAction::Stop,
            _ => EarlyStopAction::Continue,
        }
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    pub fn best_round(&self) -> usize {
        self.best_round
    }

    pub fn current_round(&self) -> usize {
        self.current_round
    }
}
