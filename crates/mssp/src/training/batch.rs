//! Mini-batch assembly with right-padded targets.

use ndarray::Array2;

use super::curate::CuratedBlock;
use crate::normalize::BundleTensor;

/// Token id used for padding. Loss computation ignores it.
pub const PAD_TOKEN: u32 = 0;

/// Right-pad sequences with [`PAD_TOKEN`] into a `[B, max_len]` matrix.
pub fn pad_sequences<S: AsRef<[u32]>>(sequences: &[S]) -> Array2<u32> {
    let max_len = sequences.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);
    let mut out = Array2::from_elem((sequences.len(), max_len), PAD_TOKEN);
    for (mut row, seq) in out.rows_mut().into_iter().zip(sequences) {
        for (dst, &tok) in row.iter_mut().zip(seq.as_ref()) {
            *dst = tok;
        }
    }
    out
}

/// One training step worth of samples.
#[derive(Debug, Clone)]
pub struct MiniBatch {
    /// Positions of the samples in their [`CuratedBlock`].
    pub indices: Vec<usize>,
    /// `(B, N, 2, S)` model input.
    pub inputs: BundleTensor,
    /// Padded target tokens, `[B, max_len]`.
    pub targets: Array2<u32>,
}

impl MiniBatch {
    /// Gather the samples at `indices`.
    pub fn from_block(block: &CuratedBlock, indices: &[usize]) -> Self {
        let tokens: Vec<&[u32]> = indices
            .iter()
            .map(|&i| block.samples[i].tokens.as_slice())
            .collect();
        Self {
            indices: indices.to_vec(),
            inputs: block.inputs(indices),
            targets: pad_sequences(&tokens),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Split `order` into consecutive mini-batches of at most `batch_size`.
pub fn mini_batches<'a>(
    block: &'a CuratedBlock,
    order: &'a [usize],
    batch_size: usize,
) -> impl Iterator<Item = MiniBatch> + 'a {
    order
        .chunks(batch_size.max(1))
        .map(move |chunk| MiniBatch::from_block(block, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::curate::CuratedSample;
    use ndarray::array;

    fn sample(tokens: Vec<u32>) -> CuratedSample {
        CuratedSample {
            x: Array2::zeros((4, 2)),
            y: Array2::ones((4, 2)),
            tokens,
            expression: String::new(),
            set_expressions: Vec::new(),
        }
    }

    #[test]
    fn pads_to_longest() {
        let padded = pad_sequences(&[vec![1, 2, 3], vec![1], vec![1, 4]]);
        assert_eq!(padded, array![[1, 2, 3], [1, 0, 0], [1, 4, 0]]);
        let empty: [Vec<u32>; 0] = [];
        assert_eq!(pad_sequences(&empty).dim(), (0, 0));
    }

    #[test]
    fn batches_cover_order() {
        let block = CuratedBlock {
            samples: (0..5).map(|i| sample(vec![1; i + 2])).collect(),
            rejected: Vec::new(),
        };
        let order = [4, 0, 3, 1, 2];
        let batches: Vec<_> = mini_batches(&block, &order, 2).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].indices, vec![4, 0]);
        assert_eq!(batches[0].targets.dim(), (2, 6));
        assert_eq!(batches[0].inputs.dim(), (2, 4, 2, 2));
        assert_eq!(batches[2].len(), 1);
    }
}
