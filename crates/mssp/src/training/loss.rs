//! Masked sequence cross-entropy.

use ndarray::{ArrayView2, ArrayView3, Axis};

use super::batch::PAD_TOKEN;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LossError {
    #[error("logits {logits:?} do not match targets {targets:?} (expected T = L - 1 and equal batch)")]
    Shape {
        logits: (usize, usize, usize),
        targets: (usize, usize),
    },

    #[error("target token {token} outside a vocabulary of {vocab}")]
    TokenOutOfRange { token: u32, vocab: usize },

    #[error("empty batch")]
    EmptyBatch,
}

/// Mean cross-entropy over positions whose target is not `ignore_index`.
///
/// `logits` is `[T, V]`, `targets` has length `T`. Returns `None` when
/// every position is ignored.
pub fn masked_cross_entropy(
    logits: ArrayView2<f32>,
    targets: &[u32],
    ignore_index: u32,
) -> Result<Option<f64>, LossError> {
    let (t, v) = logits.dim();
    if targets.len() != t {
        return Err(LossError::Shape {
            logits: (t, 1, v),
            targets: (1, targets.len() + 1),
        });
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for (row, &target) in logits.axis_iter(Axis(0)).zip(targets) {
        if target == ignore_index {
            continue;
        }
        let k = target as usize;
        if k >= v {
            return Err(LossError::TokenOutOfRange { token: target, vocab: v });
        }
        // log-sum-exp with the max subtracted
        let max = row.iter().fold(f64::NEG_INFINITY, |m, &z| m.max(z as f64));
        let lse = max + row.iter().map(|&z| (z as f64 - max).exp()).sum::<f64>().ln();
        sum += lse - row[k] as f64;
        count += 1;
    }
    Ok((count > 0).then(|| sum / count as f64))
}

/// Batch loss: per-sample masked cross-entropy of `logits[:, b, :]` against
/// `targets[b, 1..]`, summed and divided by the batch size.
///
/// `logits` is `[T, B, V]` and `targets` `[B, T + 1]` (start sentinel first).
/// Samples whose targets are all padding contribute 0.
pub fn sequence_loss(logits: ArrayView3<f32>, targets: ArrayView2<u32>) -> Result<f64, LossError> {
    let (t, b, v) = logits.dim();
    let (tb, tl) = targets.dim();
    if tb != b || tl != t + 1 {
        return Err(LossError::Shape {
            logits: (t, b, v),
            targets: (tb, tl),
        });
    }
    if b == 0 {
        return Err(LossError::EmptyBatch);
    }

    let mut total = 0.0;
    for i in 0..b {
        let out = logits.index_axis(Axis(1), i);
        let shifted: Vec<u32> = targets.row(i).iter().skip(1).copied().collect();
        total += masked_cross_entropy(out, &shifted, PAD_TOKEN)?.unwrap_or(0.0);
    }
    Ok(total / b as f64)
}
