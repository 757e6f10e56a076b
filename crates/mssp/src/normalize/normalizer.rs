use ndarray::{Array2, ArrayView2, Axis};

use crate::config::{check_threshold, ConfigError};
use crate::data::SetBundle;
use crate::utils::{mean, std_dev};

// =============================================================================
// NormalizerParams
// =============================================================================

/// Parameters of the set normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerParams {
    /// X values are mapped into `[-x_half_range, x_half_range]`.
    pub x_half_range: f64,
    /// Sets whose Y standard deviation is below this are degenerate.
    pub min_std: f64,
}

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            x_half_range: 10.0,
            min_std: 0.01,
        }
    }
}

impl NormalizerParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("x_half_range", self.x_half_range)?;
        if self.x_half_range == 0.0 {
            return Err(ConfigError::InvalidThreshold {
                field: "x_half_range",
                value: self.x_half_range,
            });
        }
        check_threshold("min_std", self.min_std)
    }
}

// =============================================================================
// Kernels
// =============================================================================

/// Standardize each column to zero mean and unit (population) std.
///
/// Returns the standardized copy and the per-column standard deviations
/// computed before scaling.
pub fn standardize_columns(y: ArrayView2<f64>) -> (Array2<f64>, Vec<f64>) {
    let mut out = y.to_owned();
    let mut stds = Vec::with_capacity(y.ncols());
    for mut col in out.axis_iter_mut(Axis(1)) {
        let m = mean(col.view());
        let s = std_dev(col.view());
        col.mapv_inplace(|v| (v - m) / s);
        stds.push(s);
    }
    (out, stds)
}

/// Map `x` affinely so that its finite min/max land on `-half_range`/`half_range`.
///
/// Applies one transform to the whole matrix. A matrix with a single
/// distinct value maps to 0.
pub fn rescale_x(x: ArrayView2<f64>, half_range: f64) -> Array2<f64> {
    let (lo, hi) = x
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || hi <= lo {
        return x.mapv(|v| if v.is_finite() { 0.0 } else { v });
    }
    let scale = 2.0 * half_range / (hi - lo);
    x.mapv(|v| ((v - lo) * scale - half_range).clamp(-half_range, half_range))
}

// =============================================================================
// SetNormalizer
// =============================================================================

/// Health of one normalized set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetHealth {
    Healthy,
    /// Y standard deviation below the threshold.
    LowVariance { std: f64 },
    /// Raw X or Y contained NaN or infinity.
    NonFinite,
}

impl SetHealth {
    #[inline]
    pub fn is_healthy(self) -> bool {
        matches!(self, SetHealth::Healthy)
    }
}

/// Errors raised when a normalized bundle cannot feed the model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("all {n_sets} sets of the bundle are degenerate")]
    NoHealthySets { n_sets: usize },
}

/// A bundle after normalization. Owns fresh arrays; the input bundle is untouched.
#[derive(Debug, Clone)]
pub struct NormalizedBundle {
    pub variable: usize,
    /// Normalized X, `[n_samples, n_sets]`.
    pub x: Array2<f64>,
    /// Normalized Y, `[n_samples, n_sets]`.
    pub y: Array2<f64>,
    pub health: Vec<SetHealth>,
}

impl NormalizedBundle {
    #[inline]
    pub fn n_sets(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn healthy_sets(&self) -> Vec<usize> {
        (0..self.health.len()).filter(|&i| self.health[i].is_healthy()).collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.health.iter().all(|h| h.is_healthy())
    }

    /// Columns to feed the model: degenerate sets are skipped and their slots
    /// are filled by cycling through the healthy sets, keeping `n_sets` columns.
    pub fn model_columns(&self) -> Result<(Array2<f64>, Array2<f64>), NormalizeError> {
        let healthy = self.healthy_sets();
        if healthy.is_empty() {
            return Err(NormalizeError::NoHealthySets {
                n_sets: self.n_sets(),
            });
        }
        if healthy.len() == self.n_sets() {
            return Ok((self.x.clone(), self.y.clone()));
        }
        let order: Vec<usize> = (0..self.n_sets()).map(|i| healthy[i % healthy.len()]).collect();
        Ok((self.x.select(Axis(1), &order), self.y.select(Axis(1), &order)))
    }
}

/// Rescales a bundle into the canonical numeric range of the sequence model.
///
/// Y is standardized independently per set; X is rescaled with a single
/// transform over the union of all sets so relative horizontal alignment
/// between sets is preserved.
#[derive(Debug, Clone, Default)]
pub struct SetNormalizer {
    params: NormalizerParams,
}

impl SetNormalizer {
    pub fn new(params: NormalizerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NormalizerParams {
        &self.params
    }

    pub fn normalize(&self, bundle: &SetBundle) -> NormalizedBundle {
        let x_raw = bundle.x_matrix();
        let y_raw = bundle.y_matrix();

        let health: Vec<SetHealth> = bundle
            .sets()
            .iter()
            .map(|set| {
                if !set.is_finite() {
                    return SetHealth::NonFinite;
                }
                let std = set.response_std();
                if std < self.params.min_std {
                    SetHealth::LowVariance { std }
                } else {
                    SetHealth::Healthy
                }
            })
            .collect();

        let (y, _) = standardize_columns(y_raw.view());
        let x = rescale_x(x_raw.view(), self.params.x_half_range);

        NormalizedBundle {
            variable: bundle.variable(),
            x,
            y,
            health,
        }
    }
}
