//! Per-variable skeleton prediction.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::RegressorConfig;
use super::decoder::SkeletonDecoder;
use super::selector::{CandidateSelector, SelectedSkeleton};
use crate::data::Problem;
use crate::expr::{ExpressionGrammar, PrefixGrammar, Vocabulary};
use crate::fit::{CoefficientFitter, GeneticFitter};
use crate::model::{ModelError, SequenceModel};
use crate::normalize::{assemble_input, SetNormalizer};
use crate::sampling::{DomainSampler, SamplingError, Surrogate};
use crate::training::{TrainingLogger, Verbosity};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegressorError {
    #[error("a trained surrogate is required for a problem with {n_features} variables")]
    MissingSurrogate { n_features: usize },

    #[error("sampling variable `{variable}` failed: {source}")]
    Sampling {
        variable: String,
        #[source]
        source: SamplingError,
    },

    #[error("sequence model failed on variable `{variable}`: {source}")]
    Model {
        variable: String,
        #[source]
        source: ModelError,
    },
}

// =============================================================================
// UnivariateSkeletons
// =============================================================================

/// What the regressor decided for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableOutcome {
    pub symbol: String,
    /// Sequences returned by the model.
    pub n_candidates: usize,
    /// Sequences that decoded to a skeleton.
    pub n_decoded: usize,
    /// `None` when no candidate decoded or the bundle was unusable.
    pub selected: Option<SelectedSkeleton>,
}

/// Best skeleton per variable index, filled one variable at a time.
///
/// Entries are only ever added.
#[derive(Debug, Clone, Default)]
pub struct UnivariateSkeletons {
    entries: BTreeMap<usize, VariableOutcome>,
}

impl UnivariateSkeletons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `variable`. Returns `false` (and keeps the
    /// existing entry) if the variable was already decided.
    pub fn record(&mut self, variable: usize, outcome: VariableOutcome) -> bool {
        if self.entries.contains_key(&variable) {
            return false;
        }
        self.entries.insert(variable, outcome);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn outcome(&self, variable: usize) -> Option<&VariableOutcome> {
        self.entries.get(&variable)
    }

    /// The selected skeleton of `variable`, if any.
    pub fn get(&self, variable: usize) -> Option<&SelectedSkeleton> {
        self.entries.get(&variable).and_then(|o| o.selected.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &VariableOutcome)> {
        self.entries.iter().map(|(&k, v)| (k, v))
    }
}

// =============================================================================
// SymbolicRegressor
// =============================================================================

/// Runs sampling, normalization, model inference, decoding and selection
/// for every variable of a problem.
pub struct SymbolicRegressor<M, S, F = GeneticFitter, G = PrefixGrammar> {
    config: RegressorConfig,
    model: M,
    surrogate: Option<S>,
    decoder: SkeletonDecoder<G>,
    selector: CandidateSelector<F>,
}

impl<M, S> SymbolicRegressor<M, S>
where
    M: SequenceModel,
    S: Surrogate,
{
    /// Regressor with the default grammar and genetic coefficient fitter.
    pub fn new(config: RegressorConfig, model: M, surrogate: Option<S>, vocab: Arc<Vocabulary>) -> Self {
        let selector = CandidateSelector::new(GeneticFitter::default(), config.selector.clone());
        Self::with_parts(config, model, surrogate, SkeletonDecoder::new(vocab), selector)
    }
}

impl<M, S, F, G> SymbolicRegressor<M, S, F, G>
where
    M: SequenceModel,
    S: Surrogate,
    F: CoefficientFitter,
    G: ExpressionGrammar,
{
    pub fn with_parts(
        config: RegressorConfig,
        model: M,
        surrogate: Option<S>,
        decoder: SkeletonDecoder<G>,
        selector: CandidateSelector<F>,
    ) -> Self {
        Self {
            config,
            model,
            surrogate,
            decoder,
            selector,
        }
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predict a skeleton for every variable of `problem`.
    ///
    /// Fails before sampling anything when the problem has several variables
    /// and no surrogate was provided.
    pub fn predict_skeletons(&self, problem: &Problem) -> Result<UnivariateSkeletons, RegressorError> {
        let n_features = problem.n_features();
        if n_features > 1 && self.surrogate.is_none() {
            return Err(RegressorError::MissingSurrogate { n_features });
        }

        let mut logger = TrainingLogger::new(self.config.verbosity);
        let ctx = self.config.context;
        let sampler = DomainSampler::new(self.surrogate.as_ref(), ctx, self.config.sampler.clone());
        let normalizer = SetNormalizer::new(self.config.normalizer.clone());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut skeletons = UnivariateSkeletons::new();

        logger.start_training(n_features);
        for (index, variable) in problem.variables().iter().enumerate() {
            let symbol = variable.name.clone();
            logger.info(format_args!("predicting skeleton for variable {}", symbol));

            let sampled = sampler
                .sample(problem, index, &mut rng)
                .map_err(|source| RegressorError::Sampling {
                    variable: symbol.clone(),
                    source,
                })?;
            let normalized = normalizer.normalize(&sampled.bundle);
            if !normalized.is_healthy() {
                logger.warn(format_args!(
                    "variable {}: {} of {} sets are degenerate",
                    symbol,
                    normalized.n_sets() - normalized.healthy_sets().len(),
                    normalized.n_sets()
                ));
            }

            let input = match assemble_input(&normalized) {
                Ok(input) => input,
                Err(e) => {
                    logger.warn(format_args!("variable {} skipped: {}", symbol, e));
                    skeletons.record(
                        index,
                        VariableOutcome {
                            symbol,
                            n_candidates: 0,
                            n_decoded: 0,
                            selected: None,
                        },
                    );
                    continue;
                }
            };

            let candidates = self
                .model
                .infer(&ctx, &input)
                .map_err(|source| RegressorError::Model {
                    variable: symbol.clone(),
                    source,
                })?;
            let report = self.decoder.decode_all(&candidates, &symbol);
            for (i, e) in &report.failures {
                logger.debug(format_args!("variable {}: candidate {} discarded: {}", symbol, i, e));
            }

            let selection = self.selector.select(&report.skeletons, sampled.canonical());
            for (i, e) in &selection.failures {
                logger.debug(format_args!("variable {}: fit of skeleton {} failed: {}", symbol, i, e));
            }
            match &selection.selected {
                Some(s) => logger.info(format_args!("variable {}: predicted skeleton {}", symbol, s.skeleton)),
                None => logger.warn(format_args!("variable {}: no candidate decoded", symbol)),
            }
            if logger.enabled(Verbosity::Debug) {
                for s in &report.skeletons {
                    logger.debug(format_args!("  candidate {} (score {:.4})", s, s.score));
                }
            }

            skeletons.record(
                index,
                VariableOutcome {
                    symbol,
                    n_candidates: report.n_candidates(),
                    n_decoded: report.skeletons.len(),
                    selected: selection.selected,
                },
            );
        }
        logger.finish_training();
        Ok(skeletons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(symbol: &str) -> VariableOutcome {
        VariableOutcome {
            symbol: symbol.into(),
            n_candidates: 0,
            n_decoded: 0,
            selected: None,
        }
    }

    #[test]
    fn collection_never_overwrites() {
        let mut s = UnivariateSkeletons::new();
        assert!(s.record(1, outcome("a")));
        assert!(!s.record(1, outcome("b")));
        assert_eq!(s.len(), 1);
        assert_eq!(s.outcome(1).unwrap().symbol, "a");
        assert!(s.get(1).is_none());
        assert!(s.outcome(0).is_none());
    }
}
