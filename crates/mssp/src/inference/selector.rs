//! Candidate selection by coefficient-fit error.

use crate::config::{check_count, check_range, check_threshold, ConfigError};
use crate::data::SampleSet;
use crate::fit::{CoefficientFitter, FitError, FitResult};

use super::decoder::Skeleton;

// =============================================================================
// SelectorParams
// =============================================================================

/// Parameters of the candidate selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorParams {
    /// Search range of every coefficient. Default: `(-20, 20)`.
    pub coefficient_bounds: (f64, f64),
    /// Iteration budget passed to the fitter. Default: 100.
    pub max_iterations: usize,
    /// Stop at the first candidate whose fit error is below this. Default: 0.001.
    pub tolerance: f64,
}

impl Default for SelectorParams {
    fn default() -> Self {
        Self {
            coefficient_bounds: (-20.0, 20.0),
            max_iterations: 100,
            tolerance: 0.001,
        }
    }
}

impl SelectorParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("coefficient_bounds", self.coefficient_bounds)?;
        check_count("max_iterations", self.max_iterations, 1)?;
        check_threshold("tolerance", self.tolerance)?;
        Ok(())
    }
}

// =============================================================================
// Selection
// =============================================================================

/// The chosen candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSkeleton {
    /// Position in the candidate list.
    pub index: usize,
    pub skeleton: Skeleton,
    /// `None` when no candidate could be fitted and the first one was kept.
    pub fit: Option<FitResult>,
}

/// Outcome of a selection round.
#[derive(Debug, Clone, Default)]
pub struct SelectionReport {
    pub selected: Option<SelectedSkeleton>,
    /// Number of candidates handed to the fitter.
    pub fitted: usize,
    pub failures: Vec<(usize, FitError)>,
}

/// Picks the skeleton with the lowest coefficient-fit error on the canonical
/// set.
///
/// Candidates are fitted in order; the first one with error below
/// `tolerance` ends the search. If every fit fails, the first candidate is
/// kept without coefficients.
#[derive(Debug, Clone)]
pub struct CandidateSelector<F> {
    fitter: F,
    params: SelectorParams,
}

impl<F: CoefficientFitter> CandidateSelector<F> {
    pub fn new(fitter: F, params: SelectorParams) -> Self {
        Self { fitter, params }
    }

    pub fn params(&self) -> &SelectorParams {
        &self.params
    }

    pub fn select(&self, candidates: &[Skeleton], canonical: &SampleSet) -> SelectionReport {
        let mut report = SelectionReport::default();
        if candidates.is_empty() {
            return report;
        }

        let domain = finite_bounds(canonical);
        let mut best: Option<(usize, FitResult)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            report.fitted += 1;
            let result = match domain {
                Some(domain) => self.fitter.fit(
                    &candidate.expr,
                    canonical.x.view(),
                    canonical.y.view(),
                    domain,
                    self.params.coefficient_bounds,
                    self.params.max_iterations,
                ),
                None => Err(FitError::NonFinite),
            };
            match result {
                Ok(fit) => {
                    let done = fit.error < self.params.tolerance;
                    if best.as_ref().is_none_or(|(_, b)| fit.error < b.error) {
                        best = Some((i, fit));
                    }
                    if done {
                        break;
                    }
                }
                Err(e) => report.failures.push((i, e)),
            }
        }

        report.selected = Some(match best {
            Some((index, fit)) => SelectedSkeleton {
                index,
                skeleton: candidates[index].clone(),
                fit: Some(fit),
            },
            None => SelectedSkeleton {
                index: 0,
                skeleton: candidates[0].clone(),
                fit: None,
            },
        });
        report
    }
}

/// `[min(x), max(x)]` over finite values.
fn finite_bounds(set: &SampleSet) -> Option<(f64, f64)> {
    set.x
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}
