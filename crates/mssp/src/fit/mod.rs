//! Coefficient fitting for skeletons.

mod genetic;

pub use genetic::{GeneticFitter, GeneticParams};

use ndarray::ArrayView1;

use crate::expr::Expr;

/// A skeleton with its coefficients resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Skeleton with every coefficient placeholder replaced.
    pub expression: Expr,
    /// Fitted coefficient values in prefix order.
    pub coefficients: Vec<f64>,
    /// Root-mean-square error over the in-domain samples.
    pub error: f64,
}

/// Errors raised by a [`CoefficientFitter`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("x and y have different lengths ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("no samples inside the domain [{lower}, {upper}]")]
    EmptyDomain { lower: f64, upper: f64 },

    #[error("skeleton cannot be evaluated on the samples")]
    NonFinite,
}

/// Fits the numeric coefficients of a skeleton to observed data.
pub trait CoefficientFitter {
    /// Fit `skeleton` to `(x, y)` using samples with `x` inside `domain`,
    /// searching every coefficient in `coefficient_bounds`.
    fn fit(
        &self,
        skeleton: &Expr,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        domain: (f64, f64),
        coefficient_bounds: (f64, f64),
        max_iterations: usize,
    ) -> Result<FitResult, FitError>;
}

impl<F: CoefficientFitter + ?Sized> CoefficientFitter for &F {
    fn fit(
        &self,
        skeleton: &Expr,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        domain: (f64, f64),
        coefficient_bounds: (f64, f64),
        max_iterations: usize,
    ) -> Result<FitResult, FitError> {
        (**self).fit(skeleton, x, y, domain, coefficient_bounds, max_iterations)
    }
}

/// RMSE of `expr` with `coefficients` over paired samples.
///
/// Returns `+inf` when any prediction is non-finite.
pub fn rmse(expr: &Expr, coefficients: &[f64], x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::INFINITY;
    }
    let mut sse = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let pred = expr.eval(xi, coefficients);
        if !pred.is_finite() {
            return f64::INFINITY;
        }
        sse += (pred - yi) * (pred - yi);
    }
    (sse / x.len() as f64).sqrt()
}
