use ndarray::{concatenate, Array1, ArrayView1, ArrayView2, Axis};

use crate::context::ExecutionContext;

/// Errors reported by a surrogate evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurrogateError {
    #[error("surrogate expects {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("surrogate returned {got} predictions for {expected} rows")]
    OutputLength { expected: usize, got: usize },

    #[error("surrogate evaluation failed: {0}")]
    Evaluation(String),
}

/// A trained approximator of the target function, used as a cheap oracle.
pub trait Surrogate {
    /// Number of input features.
    fn n_features(&self) -> usize;

    /// Predict one output per row of `configurations` (`[n_rows, n_features]`).
    fn evaluate(
        &self,
        ctx: &ExecutionContext,
        configurations: ArrayView2<f64>,
    ) -> Result<Array1<f64>, SurrogateError>;
}

impl<S: Surrogate + ?Sized> Surrogate for &S {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn evaluate(
        &self,
        ctx: &ExecutionContext,
        configurations: ArrayView2<f64>,
    ) -> Result<Array1<f64>, SurrogateError> {
        (**self).evaluate(ctx, configurations)
    }
}

impl<S: Surrogate + ?Sized> Surrogate for Box<S> {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn evaluate(
        &self,
        ctx: &ExecutionContext,
        configurations: ArrayView2<f64>,
    ) -> Result<Array1<f64>, SurrogateError> {
        (**self).evaluate(ctx, configurations)
    }
}

/// Evaluate in chunks of `ctx.evaluation_batch_size` rows and check shapes.
pub fn evaluate_batched<S: Surrogate + ?Sized>(
    surrogate: &S,
    ctx: &ExecutionContext,
    configurations: ArrayView2<f64>,
) -> Result<Array1<f64>, SurrogateError> {
    if configurations.ncols() != surrogate.n_features() {
        return Err(SurrogateError::FeatureMismatch {
            expected: surrogate.n_features(),
            got: configurations.ncols(),
        });
    }

    let n_rows = configurations.nrows();
    let chunk = match ctx.evaluation_batch_size {
        0 => n_rows.max(1),
        n => n,
    };

    let mut parts = Vec::with_capacity(n_rows.div_ceil(chunk));
    for rows in configurations.axis_chunks_iter(Axis(0), chunk) {
        let out = surrogate.evaluate(ctx, rows)?;
        if out.len() != rows.nrows() {
            return Err(SurrogateError::OutputLength {
                expected: rows.nrows(),
                got: out.len(),
            });
        }
        parts.push(out);
    }

    if parts.is_empty() {
        return Ok(Array1::zeros(0));
    }
    let views: Vec<ArrayView1<f64>> = parts.iter().map(|p| p.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| SurrogateError::Evaluation(e.to_string()))
}

/// Surrogate backed by a row-wise closure.
///
/// Handy for analytic targets and tests.
pub struct FnSurrogate<F> {
    n_features: usize,
    f: F,
}

impl<F> FnSurrogate<F>
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    pub fn new(n_features: usize, f: F) -> Self {
        Self { n_features, f }
    }
}

impl<F> Surrogate for FnSurrogate<F>
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn evaluate(
        &self,
        _ctx: &ExecutionContext,
        configurations: ArrayView2<f64>,
    ) -> Result<Array1<f64>, SurrogateError> {
        Ok(configurations.rows().into_iter().map(|row| (self.f)(row)).collect())
    }
}

impl<F> std::fmt::Debug for FnSurrogate<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSurrogate")
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use std::cell::Cell;

    struct CountingSurrogate {
        calls: Cell<usize>,
    }

    impl Surrogate for CountingSurrogate {
        fn n_features(&self) -> usize {
            2
        }

        fn evaluate(
            &self,
            _ctx: &ExecutionContext,
            configurations: ArrayView2<f64>,
        ) -> Result<Array1<f64>, SurrogateError> {
            self.calls.set(self.calls.get() + 1);
            Ok(configurations.rows().into_iter().map(|r| r[0] + r[1]).collect())
        }
    }

    #[test]
    fn batches_respect_context() {
        let s = CountingSurrogate { calls: Cell::new(0) };
        let configs = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64);
        let ctx = ExecutionContext::cpu().with_evaluation_batch_size(4);
        let out = evaluate_batched(&s, &ctx, configs.view()).unwrap();
        assert_eq!(s.calls.get(), 3);
        assert_eq!(out.len(), 10);
        assert_eq!(out[9], 18.0 + 19.0);
    }

    #[test]
    fn feature_mismatch_is_reported() {
        let s = FnSurrogate::new(3, |r| r.sum());
        let err = evaluate_batched(&s, &ExecutionContext::cpu(), array![[1.0, 2.0]].view()).unwrap_err();
        assert_eq!(err, SurrogateError::FeatureMismatch { expected: 3, got: 2 });
    }

    #[test]
    fn short_output_is_reported() {
        struct Short;
        impl Surrogate for Short {
            fn n_features(&self) -> usize {
                1
            }
            fn evaluate(
                &self,
                _ctx: &ExecutionContext,
                _configurations: ArrayView2<f64>,
            ) -> Result<Array1<f64>, SurrogateError> {
                Ok(array![1.0])
            }
        }
        let err = evaluate_batched(&Short, &ExecutionContext::cpu(), array![[1.0], [2.0]].view())
            .unwrap_err();
        assert_eq!(err, SurrogateError::OutputLength { expected: 2, got: 1 });
    }
}
