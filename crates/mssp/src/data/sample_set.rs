use ndarray::Array1;

use crate::utils::std_dev;

/// One draw of `n` (x, y) pairs isolating a single target variable.
///
/// All other variables were held at `configuration` (when the set came from
/// the surrogate) while the target variable varied over its range.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// Index of the variable that varies.
    pub variable: usize,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    /// Fixed values of every variable; the target entry is meaningless.
    /// `None` for sets copied verbatim from an observed dataset.
    pub configuration: Option<Array1<f64>>,
    /// R² of a linear fit of `y` on `x` (0 when the response was flat).
    pub score: f64,
}

impl SampleSet {
    pub fn new(variable: usize, x: Array1<f64>, y: Array1<f64>, score: f64) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self {
            variable,
            x,
            y,
            configuration: None,
            score,
        }
    }

    pub fn with_configuration(mut self, configuration: Array1<f64>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn response_std(&self) -> f64 {
        std_dev(self.y.view())
    }

    /// True if every x and y value is finite.
    pub fn is_finite(&self) -> bool {
        self.x.iter().chain(self.y.iter()).all(|v| v.is_finite())
    }
}
