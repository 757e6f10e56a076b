//! Real-coded genetic algorithm over skeleton coefficients.

use ndarray::ArrayView1;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{rmse, CoefficientFitter, FitError, FitResult};
use crate::config::{check_count, check_probability, check_threshold, ConfigError};
use crate::expr::Expr;

/// Genetic algorithm settings. `max_iterations` of a fit call is the number
/// of generations.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticParams {
    pub population_size: usize,
    pub tournament_size: usize,
    /// Individuals copied unchanged into the next generation.
    pub elite: usize,
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Mutation step as a fraction of the coefficient range.
    pub mutation_scale: f64,
    /// Blend-crossover extension factor.
    pub blend_alpha: f64,
    pub seed: u64,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 64,
            tournament_size: 3,
            elite: 2,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
            mutation_scale: 0.05,
            blend_alpha: 0.5,
            seed: 42,
        }
    }
}

impl GeneticParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("population_size", self.population_size, 2)?;
        check_count("tournament_size", self.tournament_size, 1)?;
        check_probability("crossover_rate", self.crossover_rate)?;
        check_probability("mutation_rate", self.mutation_rate)?;
        check_threshold("mutation_scale", self.mutation_scale)?;
        check_threshold("blend_alpha", self.blend_alpha)?;
        Ok(())
    }
}

/// Coefficient fitter minimizing RMSE with a genetic algorithm.
///
/// Each fit starts from the configured seed, so fitting the same skeleton to
/// the same data always gives the same result.
#[derive(Debug, Clone, Default)]
pub struct GeneticFitter {
    params: GeneticParams,
}

type Individual = (Vec<f64>, f64);

impl GeneticFitter {
    pub fn new(params: GeneticParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GeneticParams {
        &self.params
    }

    fn tournament<'a, R: Rng>(&self, population: &'a [Individual], rng: &mut R) -> &'a [f64] {
        let mut best = rng.gen_range(0..population.len());
        for _ in 1..self.params.tournament_size {
            let idx = rng.gen_range(0..population.len());
            if population[idx].1 < population[best].1 {
                best = idx;
            }
        }
        &population[best].0
    }

    fn offspring<R: Rng>(&self, a: &[f64], b: &[f64], bounds: (f64, f64), rng: &mut R) -> Vec<f64> {
        let (lo, hi) = bounds;
        let crossover = rng.r#gen::<f64>() < self.params.crossover_rate;
        a.iter()
            .zip(b)
            .map(|(&ga, &gb)| {
                let mut gene = if crossover {
                    let d = (ga - gb).abs() * self.params.blend_alpha;
                    let (l, h) = (ga.min(gb) - d, ga.max(gb) + d);
                    if h > l { rng.gen_range(l..h) } else { ga }
                } else {
                    ga
                };
                if rng.r#gen::<f64>() < self.params.mutation_rate {
                    gene += rng.gen_range(-1.0..=1.0) * self.params.mutation_scale * (hi - lo);
                }
                gene.clamp(lo, hi)
            })
            .collect()
    }
}

impl CoefficientFitter for GeneticFitter {
    fn fit(
        &self,
        skeleton: &Expr,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        domain: (f64, f64),
        coefficient_bounds: (f64, f64),
        max_iterations: usize,
    ) -> Result<FitResult, FitError> {
        if x.len() != y.len() {
            return Err(FitError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }

        let (d_lo, d_hi) = domain;
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y.iter())
            .filter(|&(&xi, &yi)| xi >= d_lo && xi <= d_hi && yi.is_finite())
            .map(|(&xi, &yi)| (xi, yi))
            .unzip();
        if xs.is_empty() {
            return Err(FitError::EmptyDomain {
                lower: d_lo,
                upper: d_hi,
            });
        }

        let n_coef = skeleton.coefficient_count();
        if n_coef == 0 {
            let error = rmse(skeleton, &[], &xs, &ys);
            if !error.is_finite() {
                return Err(FitError::NonFinite);
            }
            return Ok(FitResult {
                expression: skeleton.clone(),
                coefficients: Vec::new(),
                error,
            });
        }

        let bounds = (
            coefficient_bounds.0.min(coefficient_bounds.1),
            coefficient_bounds.0.max(coefficient_bounds.1),
        );
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.params.seed);
        let score = |genes: Vec<f64>| -> Individual {
            let err = rmse(skeleton, &genes, &xs, &ys);
            (genes, err)
        };

        let pop_size = self.params.population_size.max(2);
        let mut population: Vec<Individual> = (0..pop_size)
            .map(|i| {
                // One individual starts at unit coefficients
                let genes = if i == 0 {
                    vec![1.0f64.clamp(bounds.0, bounds.1); n_coef]
                } else {
                    (0..n_coef).map(|_| rng.gen_range(bounds.0..=bounds.1)).collect()
                };
                score(genes)
            })
            .collect();
        population.sort_by(|a, b| a.1.total_cmp(&b.1));

        for _ in 0..max_iterations {
            if population[0].1 == 0.0 {
                break;
            }
            let mut next: Vec<Individual> = population
                .iter()
                .take(self.params.elite.min(pop_size))
                .cloned()
                .collect();
            while next.len() < pop_size {
                let a = self.tournament(&population, &mut rng);
                let b = self.tournament(&population, &mut rng);
                let child = self.offspring(a, b, bounds, &mut rng);
                next.push(score(child));
            }
            next.sort_by(|a, b| a.1.total_cmp(&b.1));
            population = next;
        }

        let (coefficients, error) = population.swap_remove(0);
        if !error.is_finite() {
            return Err(FitError::NonFinite);
        }
        Ok(FitResult {
            expression: skeleton.bind_coefficients(&coefficients),
            coefficients,
            error,
        })
    }
}
