//! Sequence model capability.
//!
//! The skeleton predictor itself (encoder/decoder architecture, optimizer)
//! lives outside this crate. The pipeline only needs the operations below.

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayView2, ArrayView4};

use crate::context::ExecutionContext;
use crate::normalize::BundleTensor;

/// Errors reported by a sequence model backend.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("input shape {got:?} does not match the model ({expected})")]
    InputShape { expected: String, got: Vec<usize> },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("forward pass failed: {0}")]
    Forward(String),

    #[error("optimizer step failed: {0}")]
    Optimize(String),

    #[error("failed to write checkpoint {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One candidate produced at inference time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSequence {
    /// Backend score (for instance a beam log-probability).
    pub score: f64,
    /// Token ids, including the leading start sentinel.
    pub tokens: Vec<u32>,
}

impl ScoredSequence {
    pub fn new(score: f64, tokens: Vec<u32>) -> Self {
        Self { score, tokens }
    }
}

/// Output of a training forward pass.
#[derive(Debug, Clone)]
pub struct ForwardOutput {
    /// Logits laid out `[T, B, V]`, where `T` is the target length minus the
    /// start sentinel.
    pub logits: Array3<f32>,
    /// Optional auxiliary loss added to the sequence loss.
    pub aux_loss: Option<f64>,
}

/// Train/eval switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelMode {
    Train,
    #[default]
    Eval,
}

/// A multi-set sequence-to-sequence skeleton predictor.
pub trait SequenceModel {
    /// Predict candidate token sequences for a `(1, N, 2, S)` bundle.
    fn infer(
        &self,
        ctx: &ExecutionContext,
        input: &BundleTensor,
    ) -> Result<Vec<ScoredSequence>, ModelError>;

    /// Switch between training and evaluation behavior.
    fn set_mode(&mut self, mode: ModelMode);

    /// Forward pass, fed the shifted targets, over a `(B, N, 2, S)` batch and its padded
    /// `[B, L]` targets.
    fn forward(
        &mut self,
        ctx: &ExecutionContext,
        inputs: ArrayView4<f32>,
        targets: ArrayView2<u32>,
    ) -> Result<ForwardOutput, ModelError>;

    /// Apply one optimizer step for the loss of the last forward pass.
    fn optimize(&mut self, loss: f64) -> Result<(), ModelError>;

    /// Persist the current weights.
    fn save(&self, path: &Path) -> Result<(), ModelError>;
}

impl<M: SequenceModel + ?Sized> SequenceModel for Box<M> {
    fn infer(
        &self,
        ctx: &ExecutionContext,
        input: &BundleTensor,
    ) -> Result<Vec<ScoredSequence>, ModelError> {
        (**self).infer(ctx, input)
    }

    fn set_mode(&mut self, mode: ModelMode) {
        (**self).set_mode(mode)
    }

    fn forward(
        &mut self,
        ctx: &ExecutionContext,
        inputs: ArrayView4<f32>,
        targets: ArrayView2<u32>,
    ) -> Result<ForwardOutput, ModelError> {
        (**self).forward(ctx, inputs, targets)
    }

    fn optimize(&mut self, loss: f64) -> Result<(), ModelError> {
        (**self).optimize(loss)
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        (**self).save(path)
    }
}
