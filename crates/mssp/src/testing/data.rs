use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{BlockIoError, BlockWriter, Problem, SampleRecord, Variable};
use crate::expr::{Expr, Vocabulary};

/// A problem with `n_rows` observations drawn uniformly over each variable's
/// range and targets `f(row)`.
///
/// # Panics
/// Panics if `variables` is empty or holds an invalid range.
pub fn random_problem<F>(name: &str, variables: Vec<Variable>, n_rows: usize, seed: u64, f: F) -> Problem
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let x = Array2::from_shape_fn((n_rows, variables.len()), |(_, j)| variables[j].draw_uniform(&mut rng));
    let y: Array1<f64> = x.rows().into_iter().map(&f).collect();
    Problem::new(name, variables, x, y).expect("valid synthetic problem")
}

/// A stored training record for `skeleton`.
///
/// X is uniform in `[-x_range, x_range]`; each set draws its own
/// coefficients in `[-3, 3]`.
///
/// # Panics
/// Panics if the skeleton holds words missing from `vocab`.
pub fn synthetic_record(
    skeleton: &Expr,
    vocab: &Vocabulary,
    n_rows: usize,
    n_sets: usize,
    x_range: f64,
    seed: u64,
) -> SampleRecord {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut x = Array2::zeros((n_rows, n_sets));
    let mut y = Array2::zeros((n_rows, n_sets));
    let mut set_expressions = Vec::with_capacity(n_sets);

    for j in 0..n_sets {
        let coefficients: Vec<f64> = (0..skeleton.coefficient_count())
            .map(|_| rng.gen_range(-3.0..3.0))
            .collect();
        for i in 0..n_rows {
            let xi = rng.gen_range(-x_range..=x_range);
            x[[i, j]] = xi;
            y[[i, j]] = skeleton.eval(xi, &coefficients);
        }
        set_expressions.push(skeleton.bind_coefficients(&coefficients).to_string());
    }

    let tokens = vocab
        .encode(&skeleton.to_prefix())
        .expect("skeleton words are in the vocabulary");
    SampleRecord {
        x,
        y,
        tokens: Some(tokens),
        expression: skeleton.to_string(),
        set_expressions,
    }
}

/// Write `n_records` synthetic records cycling through `skeletons` into
/// numbered blocks under `dir`.
#[allow(clippy::too_many_arguments)]
pub fn write_synthetic_blocks(
    dir: &Path,
    skeletons: &[Expr],
    vocab: &Vocabulary,
    n_records: usize,
    records_per_block: usize,
    n_rows: usize,
    n_sets: usize,
    seed: u64,
) -> Result<Vec<PathBuf>, BlockIoError> {
    let mut writer = BlockWriter::new(dir, records_per_block)?;
    for i in 0..n_records {
        let skeleton = &skeletons[i % skeletons.len()];
        writer.push(synthetic_record(skeleton, vocab, n_rows, n_sets, 12.0, seed + i as u64))?;
    }
    writer.finish()
}
