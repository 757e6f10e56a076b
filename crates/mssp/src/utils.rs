//! Common utilities used across the crate.
//!
//! This module provides the small statistical kernels shared by the sampler,
//! the normalizer and the batch curator, plus the parallelism flag used when
//! curating training blocks.

use ndarray::ArrayView1;
use rayon::prelude::*;

// =============================================================================
// Statistical Utilities
// =============================================================================

/// Arithmetic mean of a view. Returns `NaN` for an empty view.
#[inline]
pub fn mean(values: ArrayView1<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sum() / values.len() as f64
}

/// Population standard deviation (`ddof = 0`).
///
/// Returns `NaN` for an empty view. Non-finite inputs propagate.
#[inline]
pub fn std_dev(values: ArrayView1<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination of the fit on the same data.
    pub r2: f64,
}

/// Fit an ordinary least-squares line through `(x, y)` and score it.
///
/// R² follows the usual convention for degenerate targets: a constant `y`
/// that is predicted exactly scores `1.0`, otherwise `0.0`.
///
/// # Panics
/// Panics if `x` and `y` have different lengths.
pub fn linear_fit(x: ArrayView1<f64>, y: ArrayView1<f64>) -> LinearFit {
    assert_eq!(x.len(), y.len(), "x and y must have the same length");
    let n = x.len();
    if n == 0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r2: 0.0,
        };
    }

    let mx = mean(x);
    let my = mean(y);
    let (sxy, sxx) = x
        .iter()
        .zip(y.iter())
        .fold((0.0f64, 0.0f64), |(sxy, sxx), (&xi, &yi)| {
            (sxy + (xi - mx) * (yi - my), sxx + (xi - mx) * (xi - mx))
        });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = my - slope * mx;

    let (ss_res, ss_tot) = x
        .iter()
        .zip(y.iter())
        .fold((0.0f64, 0.0f64), |(res, tot), (&xi, &yi)| {
            let pred = slope * xi + intercept;
            (res + (yi - pred) * (yi - pred), tot + (yi - my) * (yi - my))
        });

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        r2,
    }
}

/// Index of the element holding rank `rank` in ascending order of `scores`.
///
/// Ties keep their original order. `rank` is clamped to the last position so
/// short score lists still resolve to an element. Returns `None` when
/// `scores` is empty.
pub fn index_at_rank(scores: &[f64], rank: usize) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    Some(order[rank.min(order.len() - 1)])
}

/// `n` evenly spaced values over `[lower, upper]`, endpoints included.
pub fn linspace(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (n - 1) as f64;
            (0..n).map(|i| lower + step * i as f64).collect()
        }
    }
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Components that can process independent records respect this flag: when
/// `Parallel`, they may use `rayon` parallel iterators; when `Sequential`,
/// they iterate in order on the calling thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over a slice, in parallel when allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, R, F>(self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync + Send,
    {
        if self.is_parallel() {
            items.par_iter().enumerate().map(|(i, t)| f(i, t)).collect()
        } else {
            items.iter().enumerate().map(|(i, t)| f(i, t)).collect()
        }
    }
}
