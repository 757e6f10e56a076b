//! Batch curation: stored records → normalized, validated training samples.

use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::{SplitMix64, Xoshiro256PlusPlus};

use super::window::{sample_domain, WindowExhausted};
use crate::config::{check_count, check_probability, check_threshold, ConfigError};
use crate::data::SampleRecord;
use crate::normalize::{assemble_batch, standardize_columns, BundleTensor};
use crate::utils::{std_dev, Parallelism};

// =============================================================================
// CuratorParams
// =============================================================================

/// Parameters of the batch curator.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorParams {
    /// Rows per set after windowing (`N`).
    pub block_size: usize,
    /// Sets per record (`S`).
    pub n_sets: usize,
    /// Token sequences of this length or longer are dropped.
    pub max_sequence_len: usize,
    /// Sets with a windowed Y standard deviation below this reject the record.
    pub min_std: f64,
    /// Probability of replicating one set into every column.
    pub collapse_probability: f64,
    /// Expressions containing this character are known-bad records.
    pub marker: char,
    /// Initial window half-width is drawn from `min_half_width..max_half_width_exclusive`.
    pub min_half_width: usize,
    pub max_half_width_exclusive: usize,
    /// Widening stops at this half-width.
    pub max_half_width_cap: usize,
    /// Largest shortfall covered by re-drawing rows instead of widening.
    pub oversample_limit: usize,
    /// Windowed X of each set is rescaled into `[-x_half_range, x_half_range]`.
    pub x_half_range: f64,
    /// Shuffle rows inside every set after windowing.
    pub shuffle_rows: bool,
}

impl Default for CuratorParams {
    fn default() -> Self {
        Self {
            block_size: 1000,
            n_sets: 10,
            max_sequence_len: 60,
            min_std: 0.01,
            collapse_probability: 0.3,
            marker: 'E',
            min_half_width: 3,
            max_half_width_exclusive: 10,
            max_half_width_cap: 64,
            oversample_limit: 200,
            x_half_range: 10.0,
            shuffle_rows: true,
        }
    }
}

impl CuratorParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("block_size", self.block_size, 1)?;
        check_count("n_sets", self.n_sets, 1)?;
        check_count("max_sequence_len", self.max_sequence_len, 2)?;
        check_threshold("min_std", self.min_std)?;
        check_probability("collapse_probability", self.collapse_probability)?;
        check_count(
            "max_half_width_exclusive",
            self.max_half_width_exclusive,
            self.min_half_width + 1,
        )?;
        check_count("max_half_width_cap", self.max_half_width_cap, self.min_half_width)?;
        check_threshold("x_half_range", self.x_half_range)?;
        Ok(())
    }
}

// =============================================================================
// Curated output
// =============================================================================

/// Why a stored record was left out of a batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("record has no token sequence")]
    MissingTokens,

    #[error("expression is marked as invalid")]
    Marked,

    #[error("record has {available} sets, {required} required")]
    TooFewSets { available: usize, required: usize },

    #[error("x and y shapes differ")]
    ShapeMismatch,

    #[error("token sequence of length {len} reaches the limit {max}")]
    SequenceTooLong { len: usize, max: usize },

    #[error(transparent)]
    Window(#[from] WindowExhausted),

    #[error("set {set} has response std {std} below the threshold")]
    LowVariance { set: usize, std: f64 },

    #[error("sample values are not finite")]
    NonFinite,
}

/// A record ready for the model.
#[derive(Debug, Clone)]
pub struct CuratedSample {
    /// Normalized X, `[block_size, n_sets]`.
    pub x: Array2<f64>,
    /// Standardized Y, `[block_size, n_sets]`.
    pub y: Array2<f64>,
    pub tokens: Vec<u32>,
    pub expression: String,
    pub set_expressions: Vec<String>,
}

/// Accepted samples and rejected record indices of one block.
#[derive(Debug, Clone, Default)]
pub struct CuratedBlock {
    pub samples: Vec<CuratedSample>,
    pub rejected: Vec<(usize, RejectReason)>,
}

impl CuratedBlock {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(B, N, 2, S)` tensor of the samples at `indices`.
    pub fn inputs(&self, indices: &[usize]) -> BundleTensor {
        let pairs: Vec<_> = indices
            .iter()
            .map(|&i| (self.samples[i].x.view(), self.samples[i].y.view()))
            .collect();
        assemble_batch(&pairs)
    }
}

/// Seed of the RNG used for one record.
///
/// Mixing epoch, block and record positions keeps curation reproducible
/// regardless of the order records are processed in.
pub fn record_seed(seed: u64, epoch: usize, block: usize, record: usize) -> u64 {
    let mut h = seed;
    for v in [epoch as u64, block as u64, record as u64] {
        h = SplitMix64::seed_from_u64(h ^ v.wrapping_mul(0x9E37_79B9_7F4A_7C15)).next_u64();
    }
    h
}

// =============================================================================
// BatchCurator
// =============================================================================

/// Turns stored records into normalized training samples.
///
/// Per record: reject marked or token-less records, re-window the sets
/// (see [`sample_domain`]) and shuffle rows. Non-finite windows and
/// low-variance sets are rejected on the raw values, before Y is
/// standardized per set.
#[derive(Debug, Clone, Default)]
pub struct BatchCurator {
    params: CuratorParams,
    parallelism: Parallelism,
}

impl BatchCurator {
    pub fn new(params: CuratorParams, parallelism: Parallelism) -> Self {
        Self { params, parallelism }
    }

    pub fn params(&self) -> &CuratorParams {
        &self.params
    }

    /// Curate one record with its own RNG.
    pub fn curate_record(&self, record: &SampleRecord, seed: u64) -> Result<CuratedSample, RejectReason> {
        let p = &self.params;
        let tokens = record.tokens.as_ref().ok_or(RejectReason::MissingTokens)?;
        if record.expression.contains(p.marker) {
            return Err(RejectReason::Marked);
        }
        if record.x.dim() != record.y.dim() {
            return Err(RejectReason::ShapeMismatch);
        }
        if record.x.ncols() < p.n_sets {
            return Err(RejectReason::TooFewSets {
                available: record.x.ncols(),
                required: p.n_sets,
            });
        }
        if tokens.len() >= p.max_sequence_len {
            return Err(RejectReason::SequenceTooLong {
                len: tokens.len(),
                max: p.max_sequence_len,
            });
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut window = sample_domain(record.x.view(), record.y.view(), &record.set_expressions, p, &mut rng)?;

        if p.shuffle_rows {
            for j in 0..p.n_sets {
                let mut order: Vec<usize> = (0..p.block_size).collect();
                order.shuffle(&mut rng);
                let xs = window.x.column(j).select(Axis(0), &order);
                let ys = window.y.column(j).select(Axis(0), &order);
                window.x.column_mut(j).assign(&xs);
                window.y.column_mut(j).assign(&ys);
            }
        }

        if !all_finite(window.x.view()) || !all_finite(window.y.view()) {
            return Err(RejectReason::NonFinite);
        }
        if let Some((set, std)) = window
            .y
            .axis_iter(Axis(1))
            .map(std_dev)
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
        {
            if std < p.min_std {
                return Err(RejectReason::LowVariance { set, std });
            }
        }

        let (y, _) = standardize_columns(window.y.view());
        if !all_finite(y.view()) {
            return Err(RejectReason::NonFinite);
        }

        Ok(CuratedSample {
            x: window.x,
            y,
            tokens: tokens.clone(),
            expression: record.expression.clone(),
            set_expressions: window.set_expressions,
        })
    }

    /// Curate every record of a block. Record `i` uses
    /// `record_seed(seed, epoch, block, i)`.
    pub fn curate_block(
        &self,
        records: &[SampleRecord],
        seed: u64,
        epoch: usize,
        block: usize,
    ) -> CuratedBlock {
        let results = self
            .parallelism
            .maybe_par_map(records, |i, r| self.curate_record(r, record_seed(seed, epoch, block, i)));

        let mut out = CuratedBlock::default();
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(sample) => out.samples.push(sample),
                Err(reason) => out.rejected.push((i, reason)),
            }
        }
        out
    }
}

fn all_finite(a: ArrayView2<f64>) -> bool {
    a.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn record(rows: usize, sets: usize, amplitude: f64) -> SampleRecord {
        let col = Array1::linspace(-10.0, 10.0, rows);
        let x = Array2::from_shape_fn((rows, sets), |(i, _)| col[i]);
        let y = Array2::from_shape_fn((rows, sets), |(i, j)| amplitude * (col[i] * (j + 1) as f64).sin());
        SampleRecord {
            x,
            y,
            tokens: Some(vec![1, 5, 3, 4, 2]),
            expression: "sin(x_1)".into(),
            set_expressions: (0..sets).map(|j| format!("sin({}*x_1)", j + 1)).collect(),
        }
    }

    fn curator(block_size: usize, n_sets: usize) -> BatchCurator {
        BatchCurator::new(
            CuratorParams {
                block_size,
                n_sets,
                collapse_probability: 0.0,
                ..Default::default()
            },
            Parallelism::Sequential,
        )
    }

    #[test]
    fn accepted_sample_is_normalized() {
        let c = curator(64, 3);
        let s = c.curate_record(&record(2000, 3, 2.0), 9).unwrap();
        assert_eq!(s.x.dim(), (64, 3));
        for j in 0..3 {
            let col = s.y.column(j);
            assert!(col.mean().unwrap().abs() < 1e-9);
            assert!((crate::utils::std_dev(col) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rejections() {
        let c = curator(64, 3);
        let mut r = record(2000, 3, 2.0);
        r.tokens = None;
        assert_eq!(c.curate_record(&r, 0).unwrap_err(), RejectReason::MissingTokens);

        let mut r = record(2000, 3, 2.0);
        r.expression = "x_1*E".into();
        assert_eq!(c.curate_record(&r, 0).unwrap_err(), RejectReason::Marked);

        let r = record(2000, 2, 2.0);
        assert!(matches!(c.curate_record(&r, 0), Err(RejectReason::TooFewSets { .. })));

        let mut r = record(2000, 3, 2.0);
        r.tokens = Some(vec![1; 60]);
        assert!(matches!(c.curate_record(&r, 0), Err(RejectReason::SequenceTooLong { .. })));

        let mut r = record(2000, 3, 2.0);
        r.y.column_mut(1).fill(f64::NAN);
        assert_eq!(c.curate_record(&r, 0).unwrap_err(), RejectReason::NonFinite);
    }

    #[test]
    fn flat_response_rejected_before_normalization() {
        let c = curator(64, 3);
        let r = record(2000, 3, 0.005);
        match c.curate_record(&r, 1).unwrap_err() {
            RejectReason::LowVariance { std, .. } => assert!(std <= 0.005),
            other => panic!("unexpected rejection: {other}"),
        }
    }

    #[test]
    fn non_finite_is_checked_before_variance() {
        let c = curator(64, 3);
        let mut r = record(2000, 3, 0.005);
        r.y.column_mut(2).fill(f64::INFINITY);
        assert_eq!(c.curate_record(&r, 1).unwrap_err(), RejectReason::NonFinite);
    }

    #[test]
    fn block_curation_is_reproducible() {
        let records = vec![record(500, 2, 1.0), record(500, 2, 0.001), record(500, 2, 3.0)];
        let seq = curator(32, 2).curate_block(&records, 5, 0, 0);
        let par = BatchCurator::new(curator(32, 2).params().clone(), Parallelism::Parallel)
            .curate_block(&records, 5, 0, 0);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.rejected.len(), 1);
        assert_eq!(seq.rejected[0].0, 1);
        for (a, b) in seq.samples.iter().zip(&par.samples) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
        assert_eq!(seq.inputs(&[0, 1]).dim(), (2, 32, 2, 2));
    }

    #[test]
    fn record_seeds_differ() {
        assert_ne!(record_seed(1, 0, 0, 0), record_seed(1, 0, 0, 1));
        assert_ne!(record_seed(1, 0, 1, 0), record_seed(1, 1, 0, 0));
        assert_ne!(record_seed(1, 0, 0, 0), record_seed(2, 0, 0, 0));
        assert_eq!(record_seed(3, 2, 1, 0), record_seed(3, 2, 1, 0));

        let mut seen = std::collections::HashSet::new();
        for epoch in 0..4 {
            for block in 0..4 {
                for i in 0..16 {
                    assert!(seen.insert(record_seed(7, epoch, block, i)));
                }
            }
        }
    }

    #[test]
    fn default_params_validate() {
        assert!(CuratorParams::default().validate().is_ok());
        let bad = CuratorParams {
            max_half_width_exclusive: 3,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
