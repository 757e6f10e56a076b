//! Loss bookkeeping for the training loop.
//!
//! Provides [`MetricValue`] for reporting named losses and [`LossAccumulator`]
//! for running averages over mini-batches.

// =============================================================================
// MetricValue
// =============================================================================

/// A named loss reported at the end of an epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// `train-loss` or `valid-loss`.
    pub name: &'static str,
    pub value: f64,
}

impl MetricValue {
    pub fn loss(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.6}", self.name, self.value)
    }
}

// =============================================================================
// LossAccumulator
// =============================================================================

/// Running sum of per-sample losses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossAccumulator {
    sum: f64,
    count: usize,
}

impl LossAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, loss: f64, count: usize) {
        self.sum += loss;
        self.count += count;
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean loss, or `None` if nothing was accumulated.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_value_display() {
        let loss = MetricValue::loss("valid-loss", 0.5);
        assert_eq!(loss.to_string(), "valid-loss: 0.500000");
    }

    #[test]
    fn accumulator_mean() {
        let mut acc = LossAccumulator::new();
        assert_eq!(acc.mean(), None);
        acc.add(3.0, 2);
        acc.add(1.0, 2);
        assert_eq!(acc.mean(), Some(1.0));
        acc.reset();
        assert_eq!(acc.count(), 0);
    }
}
