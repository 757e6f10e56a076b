//! Domain re-windowing of stored sample sets.
//!
//! Stored records cover a wide X range. For training, every set is cut down
//! to a random symmetric window `[-d, d]` and refilled to exactly
//! `block_size` rows. A window too sparse to fill is widened by one and all
//! sets are redone; the width is capped so the loop always ends.

use ndarray::{s, Array2, ArrayView1, ArrayView2};
use rand::seq::index;
use rand::Rng;

use super::curate::CuratorParams;
use crate::normalize::rescale_x;

/// A windowed copy of one record.
#[derive(Debug, Clone)]
pub struct DomainWindow {
    /// Half-width that finally filled every set.
    pub half_width: usize,
    /// Windowed X, each set rescaled into `[-x_half_range, x_half_range]`.
    pub x: Array2<f64>,
    /// Windowed raw Y.
    pub y: Array2<f64>,
    pub set_expressions: Vec<String>,
    /// Set replicated into every column, if the record was collapsed.
    pub collapsed_to: Option<usize>,
    /// Number of times the window was widened.
    pub widenings: usize,
}

/// The window could not be filled even at the maximum width.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("set {set} has no rows within [-{half_width}, {half_width}]")]
pub struct WindowExhausted {
    pub set: usize,
    pub half_width: usize,
}

/// Bounded widening state for one record.
#[derive(Debug, Clone, Copy)]
struct WindowRetry {
    half_width: usize,
    cap: usize,
    widenings: usize,
}

impl WindowRetry {
    fn new(half_width: usize, cap: usize) -> Self {
        Self {
            half_width: half_width.min(cap),
            cap,
            widenings: 0,
        }
    }

    fn at_cap(&self) -> bool {
        self.half_width >= self.cap
    }

    /// Widen by one. Returns `false` once the cap is reached.
    fn widen(&mut self) -> bool {
        if self.at_cap() {
            return false;
        }
        self.half_width += 1;
        self.widenings += 1;
        true
    }
}

/// Row indices of `x` filling a `block_size` window at `half_width`, or
/// `None` when this width cannot fill it.
///
/// Rows in range are subsampled without replacement when there are too many.
/// A small shortfall is covered by re-drawing in-range rows without
/// replacement; at the width cap any shortfall is covered with replacement.
fn select_rows<R: Rng + ?Sized>(
    x: ArrayView1<f64>,
    half_width: usize,
    params: &CuratorParams,
    at_cap: bool,
    rng: &mut R,
) -> Option<Vec<usize>> {
    let d = half_width as f64;
    let in_range: Vec<usize> = x
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= -d && v <= d)
        .map(|(i, _)| i)
        .collect();
    let block = params.block_size;

    if in_range.len() >= block {
        if in_range.len() == block {
            return Some(in_range);
        }
        let picked = index::sample(rng, in_range.len(), block);
        return Some(picked.into_iter().map(|i| in_range[i]).collect());
    }
    if in_range.is_empty() {
        return None;
    }

    let remaining = block - in_range.len();
    let mut rows = in_range.clone();
    if at_cap {
        rows.extend((0..remaining).map(|_| in_range[rng.gen_range(0..in_range.len())]));
        return Some(rows);
    }
    if remaining < params.oversample_limit && remaining <= in_range.len() {
        let extra = index::sample(rng, in_range.len(), remaining);
        rows.extend(extra.into_iter().map(|i| in_range[i]));
        return Some(rows);
    }
    None
}

/// Re-window the first `params.n_sets` sets of a record.
///
/// `x`/`y` are `[rows, sets]` and must hold at least `params.n_sets` columns.
/// With probability `collapse_probability`, every set (and its expression)
/// is then replaced by one randomly chosen set.
pub fn sample_domain<R: Rng + ?Sized>(
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
    set_expressions: &[String],
    params: &CuratorParams,
    rng: &mut R,
) -> Result<DomainWindow, WindowExhausted> {
    let n_sets = params.n_sets;
    debug_assert!(x.ncols() >= n_sets && y.ncols() >= n_sets);

    let mut retry = WindowRetry::new(
        rng.gen_range(params.min_half_width..params.max_half_width_exclusive),
        params.max_half_width_cap,
    );
    let mut wx = Array2::zeros((params.block_size, n_sets));
    let mut wy = Array2::zeros((params.block_size, n_sets));

    let mut set = 0;
    while set < n_sets {
        let Some(rows) = select_rows(x.column(set), retry.half_width, params, retry.at_cap(), rng) else {
            if retry.widen() {
                set = 0;
                continue;
            }
            return Err(WindowExhausted {
                set,
                half_width: retry.half_width,
            });
        };
        for (r, &row) in rows.iter().enumerate() {
            wx[[r, set]] = x[[row, set]];
            wy[[r, set]] = y[[row, set]];
        }
        let scaled = rescale_x(wx.slice(s![.., set..set + 1]), params.x_half_range);
        wx.slice_mut(s![.., set..set + 1]).assign(&scaled);
        set += 1;
    }

    let mut expressions: Vec<String> = set_expressions.iter().take(n_sets).cloned().collect();
    let mut collapsed_to = None;
    if rng.r#gen::<f64>() < params.collapse_probability {
        let k = rng.gen_range(0..n_sets);
        let col_x = wx.column(k).to_owned();
        let col_y = wy.column(k).to_owned();
        for j in 0..n_sets {
            wx.column_mut(j).assign(&col_x);
            wy.column_mut(j).assign(&col_y);
        }
        if let Some(e) = expressions.get(k).cloned() {
            expressions = vec![e; n_sets];
        }
        collapsed_to = Some(k);
    }

    Ok(DomainWindow {
        half_width: retry.half_width,
        x: wx,
        y: wy,
        set_expressions: expressions,
        collapsed_to,
        widenings: retry.widenings,
    })
}
