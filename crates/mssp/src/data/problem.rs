use ndarray::{Array1, Array2};

use super::Variable;

/// Errors raised when a problem definition is inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProblemError {
    #[error("problem must define at least one variable")]
    NoVariables,

    #[error("invalid range for variable {name}: [{lower}, {upper}]")]
    InvalidRange { name: String, lower: f64, upper: f64 },

    #[error("feature matrix has {got} columns, expected {expected} (one per variable)")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("feature matrix has {rows} rows but target has {targets} values")]
    RowCountMismatch { rows: usize, targets: usize },
}

/// An observed regression problem.
///
/// Immutable once constructed: variables and data are validated up front.
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    variables: Vec<Variable>,
    /// Observations, `[n_rows, n_features]`.
    x: Array2<f64>,
    /// Targets, `[n_rows]`.
    y: Array1<f64>,
}

impl Problem {
    pub fn new(
        name: impl Into<String>,
        variables: Vec<Variable>,
        x: Array2<f64>,
        y: Array1<f64>,
    ) -> Result<Self, ProblemError> {
        if variables.is_empty() {
            return Err(ProblemError::NoVariables);
        }
        if let Some(v) = variables.iter().find(|v| !v.is_valid()) {
            return Err(ProblemError::InvalidRange {
                name: v.name.clone(),
                lower: v.lower,
                upper: v.upper,
            });
        }
        if x.ncols() != variables.len() {
            return Err(ProblemError::FeatureCountMismatch {
                expected: variables.len(),
                got: x.ncols(),
            });
        }
        if x.nrows() != y.len() {
            return Err(ProblemError::RowCountMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            variables,
            x,
            y,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rejects_mismatched_shapes() {
        let vars = vec![Variable::continuous("x0", 0.0, 1.0)];
        let err = Problem::new("p", vars.clone(), array![[0.0, 1.0]], array![1.0]).unwrap_err();
        assert_eq!(
            err,
            ProblemError::FeatureCountMismatch {
                expected: 1,
                got: 2
            }
        );
        let err = Problem::new("p", vars, array![[0.0], [1.0]], array![1.0]).unwrap_err();
        assert_eq!(err, ProblemError::RowCountMismatch { rows: 2, targets: 1 });
    }

    #[test]
    fn rejects_empty_and_invalid_variables() {
        let err = Problem::new("p", vec![], Array2::zeros((0, 0)), Array1::zeros(0)).unwrap_err();
        assert_eq!(err, ProblemError::NoVariables);
        let vars = vec![Variable::continuous("x0", 1.0, 0.0)];
        let err = Problem::new("p", vars, Array2::zeros((0, 1)), Array1::zeros(0)).unwrap_err();
        assert!(matches!(err, ProblemError::InvalidRange { .. }));
    }

    #[test]
    fn accessors() {
        let vars = vec![
            Variable::continuous("x0", 0.0, 1.0),
            Variable::discrete("x1", 0.0, 10.0),
        ];
        let p = Problem::new("E1", vars, array![[0.5, 2.0]], array![3.0]).unwrap();
        assert_eq!(p.name(), "E1");
        assert_eq!(p.n_features(), 2);
        assert_eq!(p.n_rows(), 1);
        assert_eq!(p.variable(1).map(|v| v.name.as_str()), Some("x1"));
    }
}
