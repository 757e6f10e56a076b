use ndarray::{s, Array4, ArrayView2};

use super::normalizer::{NormalizeError, NormalizedBundle};

/// Channel holding normalized X.
pub const CHANNEL_X: usize = 0;
/// Channel holding normalized Y.
pub const CHANNEL_Y: usize = 1;

/// Model input, `[batch, n_samples, 2, n_sets]`.
pub type BundleTensor = Array4<f32>;

/// Pack a normalized bundle into a `(1, N, 2, S)` tensor.
///
/// Degenerate sets are skipped as described in
/// [`NormalizedBundle::model_columns`].
pub fn assemble_input(bundle: &NormalizedBundle) -> Result<BundleTensor, NormalizeError> {
    let (x, y) = bundle.model_columns()?;
    Ok(assemble_batch(&[(x.view(), y.view())]))
}

/// Stack `(x, y)` pairs of `[N, S]` matrices into a `(B, N, 2, S)` tensor.
///
/// # Panics
/// Panics if the pairs do not all share the same shape.
pub fn assemble_batch(items: &[(ArrayView2<f64>, ArrayView2<f64>)]) -> BundleTensor {
    let (n, s_count) = items.first().map(|(x, _)| x.dim()).unwrap_or((0, 0));
    let mut out = Array4::<f32>::zeros((items.len(), n, 2, s_count));
    for (b, (x, y)) in items.iter().enumerate() {
        assert_eq!(x.dim(), (n, s_count), "x shape mismatch in batch item {}", b);
        assert_eq!(y.dim(), (n, s_count), "y shape mismatch in batch item {}", b);
        out.slice_mut(s![b, .., CHANNEL_X, ..]).assign(&x.mapv(|v| v as f32));
        out.slice_mut(s![b, .., CHANNEL_Y, ..]).assign(&y.mapv(|v| v as f32));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleSet, SetBundle};
    use crate::normalize::SetNormalizer;
    use ndarray::array;

    #[test]
    fn layout_is_samples_channels_sets() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![[-1.0, -2.0], [-3.0, -4.0], [-5.0, -6.0]];
        let t = assemble_batch(&[(x.view(), y.view())]);
        assert_eq!(t.dim(), (1, 3, 2, 2));
        assert_eq!(t[[0, 1, CHANNEL_X, 1]], 4.0);
        assert_eq!(t[[0, 2, CHANNEL_Y, 0]], -5.0);
    }

    #[test]
    fn assemble_input_from_bundle() {
        let sets = (0..3)
            .map(|k| {
                let x = array![0.0, 1.0, 2.0, 3.0] + k as f64;
                let y = x.mapv(|v: f64| v.powi(2));
                SampleSet::new(1, x, y, 0.0)
            })
            .collect();
        let bundle = SetBundle::new(sets).unwrap();
        let normalized = SetNormalizer::default().normalize(&bundle);
        let t = assemble_input(&normalized).unwrap();
        assert_eq!(t.dim(), (1, 4, 2, 3));
        assert_eq!(t[[0, 0, CHANNEL_X, 0]], -10.0);
        assert_eq!(t[[0, 3, CHANNEL_X, 2]], 10.0);
    }
}
