use ndarray::{Array2, Axis};

use super::SampleSet;

/// Errors raised when assembling a [`SetBundle`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BundleError {
    #[error("a bundle needs at least one sample set")]
    Empty,

    #[error("set {index} targets variable {got}, bundle targets {expected}")]
    VariableMismatch { index: usize, expected: usize, got: usize },

    #[error("set {index} has {got} samples, bundle has {expected}")]
    LengthMismatch { index: usize, expected: usize, got: usize },
}

/// `S` sample sets observing the same variable with the same sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct SetBundle {
    variable: usize,
    sets: Vec<SampleSet>,
}

impl SetBundle {
    pub fn new(sets: Vec<SampleSet>) -> Result<Self, BundleError> {
        let first = sets.first().ok_or(BundleError::Empty)?;
        let (variable, n) = (first.variable, first.len());
        for (index, set) in sets.iter().enumerate() {
            if set.variable != variable {
                return Err(BundleError::VariableMismatch {
                    index,
                    expected: variable,
                    got: set.variable,
                });
            }
            if set.len() != n {
                return Err(BundleError::LengthMismatch {
                    index,
                    expected: n,
                    got: set.len(),
                });
            }
        }
        Ok(Self { variable, sets })
    }

    #[inline]
    pub fn variable(&self) -> usize {
        self.variable
    }

    #[inline]
    pub fn n_sets(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sets[0].len()
    }

    pub fn sets(&self) -> &[SampleSet] {
        &self.sets
    }

    /// X values as a `[n_samples, n_sets]` matrix.
    pub fn x_matrix(&self) -> Array2<f64> {
        self.column_matrix(|s| &s.x)
    }

    /// Y values as a `[n_samples, n_sets]` matrix.
    pub fn y_matrix(&self) -> Array2<f64> {
        self.column_matrix(|s| &s.y)
    }

    fn column_matrix(&self, column: impl Fn(&SampleSet) -> &ndarray::Array1<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((self.n_samples(), self.n_sets()));
        for (mut col, set) in out.axis_iter_mut(Axis(1)).zip(&self.sets) {
            col.assign(column(set));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn set(variable: usize, x: ndarray::Array1<f64>) -> SampleSet {
        let y = x.mapv(|v| v * 2.0);
        SampleSet::new(variable, x, y, 0.0)
    }

    #[test]
    fn rejects_inconsistent_sets() {
        assert_eq!(SetBundle::new(vec![]).unwrap_err(), BundleError::Empty);
        let err = SetBundle::new(vec![set(0, array![1.0]), set(1, array![1.0])]).unwrap_err();
        assert!(matches!(err, BundleError::VariableMismatch { index: 1, .. }));
        let err = SetBundle::new(vec![set(0, array![1.0]), set(0, array![1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, BundleError::LengthMismatch { index: 1, .. }));
    }

    #[test]
    fn matrices_are_sample_by_set() {
        let bundle = SetBundle::new(vec![set(2, array![1.0, 2.0]), set(2, array![3.0, 4.0])]).unwrap();
        assert_eq!(bundle.variable(), 2);
        assert_eq!(bundle.x_matrix(), array![[1.0, 3.0], [2.0, 4.0]]);
        assert_eq!(bundle.y_matrix(), array![[2.0, 6.0], [4.0, 8.0]]);
    }
}
