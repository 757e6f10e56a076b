//! The domain sampler.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use super::surrogate::{evaluate_batched, Surrogate, SurrogateError};
use crate::config::{check_count, check_threshold, ConfigError};
use crate::context::ExecutionContext;
use crate::data::{BundleError, Problem, SampleSet, SetBundle};
use crate::utils::{index_at_rank, linear_fit, std_dev};

// =============================================================================
// SamplerParams
// =============================================================================

/// Parameters of the variable-isolation sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerParams {
    /// Number of sets per bundle (`S`).
    pub n_sets: usize,
    /// Samples per set (`N`). Also the row cap for single-variable problems.
    pub n_samples: usize,
    /// Candidate draws per set (`R`).
    pub n_retries: usize,
    /// Responses with a lower standard deviation score 0.
    pub min_response_std: f64,
    /// Ascending-R² rank of the candidate kept for each set.
    pub candidate_rank: usize,
    /// Ascending-R² rank of the set kept as the canonical unnormalized set.
    pub canonical_rank: usize,
    /// Grid size for drawing discrete variables.
    pub discrete_grid_points: usize,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            n_sets: 10,
            n_samples: 3000,
            n_retries: 10,
            min_response_std: 0.3,
            candidate_rank: 3,
            canonical_rank: 2,
            discrete_grid_points: 100,
        }
    }
}

impl SamplerParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("n_sets", self.n_sets, 1)?;
        check_count("n_samples", self.n_samples, 1)?;
        check_count("n_retries", self.n_retries, 1)?;
        check_count("discrete_grid_points", self.discrete_grid_points, 1)?;
        check_threshold("min_response_std", self.min_response_std)?;
        Ok(())
    }
}

// =============================================================================
// Errors and output
// =============================================================================

/// Errors raised while sampling a variable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("variable {index} out of range for a problem with {n_features} variables")]
    UnknownVariable { index: usize, n_features: usize },

    #[error("no surrogate available to sample a problem with {n_features} variables")]
    MissingSurrogate { n_features: usize },

    #[error("problem has no observations")]
    EmptyDataset,

    #[error(transparent)]
    Surrogate(#[from] SurrogateError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Output of [`DomainSampler::sample`].
#[derive(Debug, Clone)]
pub struct SampledVariable {
    /// The `S` raw sets.
    pub bundle: SetBundle,
    /// Index in the bundle of the canonical set.
    pub canonical_index: usize,
}

impl SampledVariable {
    /// The unnormalized set retained for coefficient fitting.
    pub fn canonical(&self) -> &SampleSet {
        &self.bundle.sets()[self.canonical_index]
    }
}

// =============================================================================
// DomainSampler
// =============================================================================

/// Draws sample sets in which a single variable varies.
///
/// With more than one variable, every set is chosen among `n_retries`
/// candidate draws from the surrogate: all other variables are held at a
/// random configuration, the target variable is drawn uniformly over its
/// range, and the candidate is scored by the R² of a linear fit (0 when the
/// response is flat). The candidate at `candidate_rank` in ascending score
/// order is kept. A problem with a single variable skips the surrogate and
/// replicates the observed data into every set.
pub struct DomainSampler<S> {
    surrogate: Option<S>,
    ctx: ExecutionContext,
    params: SamplerParams,
}

impl<S: Surrogate> DomainSampler<S> {
    pub fn new(surrogate: Option<S>, ctx: ExecutionContext, params: SamplerParams) -> Self {
        Self {
            surrogate,
            ctx,
            params,
        }
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    pub fn has_surrogate(&self) -> bool {
        self.surrogate.is_some()
    }

    /// Sample `S` sets isolating `variable`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        problem: &Problem,
        variable: usize,
        rng: &mut R,
    ) -> Result<SampledVariable, SamplingError> {
        if variable >= problem.n_features() {
            return Err(SamplingError::UnknownVariable {
                index: variable,
                n_features: problem.n_features(),
            });
        }

        let sets = if problem.n_features() == 1 {
            self.replicate_observed(problem, rng)?
        } else {
            let surrogate = self.surrogate.as_ref().ok_or(SamplingError::MissingSurrogate {
                n_features: problem.n_features(),
            })?;
            (0..self.params.n_sets)
                .map(|_| self.draw_set(surrogate, problem, variable, rng))
                .collect::<Result<Vec<_>, _>>()?
        };

        let scores: Vec<f64> = sets.iter().map(|s| s.score).collect();
        let canonical_index = index_at_rank(&scores, self.params.canonical_rank).unwrap_or(0);
        Ok(SampledVariable {
            bundle: SetBundle::new(sets)?,
            canonical_index,
        })
    }

    /// Copy the observed data (subsampled to `n_samples` rows) into every set.
    fn replicate_observed<R: Rng + ?Sized>(
        &self,
        problem: &Problem,
        rng: &mut R,
    ) -> Result<Vec<SampleSet>, SamplingError> {
        if problem.n_rows() == 0 {
            return Err(SamplingError::EmptyDataset);
        }

        let (x, y) = if problem.n_rows() > self.params.n_samples {
            let mut rows: Vec<usize> = (0..problem.n_rows()).collect();
            rows.shuffle(rng);
            rows.truncate(self.params.n_samples);
            (
                problem.x().column(0).select(Axis(0), &rows),
                problem.y().select(Axis(0), &rows),
            )
        } else {
            (problem.x().column(0).to_owned(), problem.y().clone())
        };

        let score = score_response(&x, &y, self.params.min_response_std);
        Ok((0..self.params.n_sets)
            .map(|_| SampleSet::new(0, x.clone(), y.clone(), score))
            .collect())
    }

    /// Draw `n_retries` candidates and keep the one at `candidate_rank`.
    fn draw_set<R: Rng + ?Sized>(
        &self,
        surrogate: &S,
        problem: &Problem,
        variable: usize,
        rng: &mut R,
    ) -> Result<SampleSet, SamplingError> {
        let n = self.params.n_samples;
        let target = &problem.variables()[variable];
        let mut candidates = Vec::with_capacity(self.params.n_retries);

        for _ in 0..self.params.n_retries {
            let configuration: Array1<f64> = problem
                .variables()
                .iter()
                .map(|v| v.draw_fixed(rng, self.params.discrete_grid_points))
                .collect();
            let x: Array1<f64> = (0..n).map(|_| target.draw_uniform(rng)).collect();

            let mut configs = Array2::zeros((n, problem.n_features()));
            for mut row in configs.rows_mut() {
                row.assign(&configuration);
            }
            configs.column_mut(variable).assign(&x);

            let y = evaluate_batched(surrogate, &self.ctx, configs.view())?;
            let score = score_response(&x, &y, self.params.min_response_std);
            candidates.push(SampleSet::new(variable, x, y, score).with_configuration(configuration));
        }

        let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
        let keep = index_at_rank(&scores, self.params.candidate_rank).unwrap_or(0);
        Ok(candidates.swap_remove(keep))
    }
}

/// R² of a linear fit, forced to 0 for flat responses.
///
/// Non-finite responses score `+inf` so they rank last.
fn score_response(x: &Array1<f64>, y: &Array1<f64>, min_std: f64) -> f64 {
    let std = std_dev(y.view());
    if !std.is_finite() {
        return f64::INFINITY;
    }
    if std < min_std {
        return 0.0;
    }
    linear_fit(x.view(), y.view()).r2
}
