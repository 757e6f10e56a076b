use std::fs;
use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array3, ArrayView2, ArrayView4};

use crate::context::ExecutionContext;
use crate::model::{ForwardOutput, ModelError, ModelMode, ScoredSequence, SequenceModel};
use crate::normalize::BundleTensor;

// =============================================================================
// ScriptedModel
// =============================================================================

/// Returns a fixed candidate list from every `infer` call and records the
/// shapes it was given. Training calls are rejected.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    candidates: Vec<ScoredSequence>,
    seen_shapes: Mutex<Vec<Vec<usize>>>,
}

impl ScriptedModel {
    pub fn new(candidates: Vec<ScoredSequence>) -> Self {
        Self {
            candidates,
            seen_shapes: Mutex::new(Vec::new()),
        }
    }

    /// Input shapes of every `infer` call so far.
    pub fn seen_shapes(&self) -> Vec<Vec<usize>> {
        self.seen_shapes.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SequenceModel for ScriptedModel {
    fn infer(
        &self,
        _ctx: &ExecutionContext,
        input: &BundleTensor,
    ) -> Result<Vec<ScoredSequence>, ModelError> {
        if input.shape()[0] != 1 || input.shape()[2] != 2 {
            return Err(ModelError::InputShape {
                expected: "(1, N, 2, S)".into(),
                got: input.shape().to_vec(),
            });
        }
        if let Ok(mut shapes) = self.seen_shapes.lock() {
            shapes.push(input.shape().to_vec());
        }
        Ok(self.candidates.clone())
    }

    fn set_mode(&mut self, _mode: ModelMode) {}

    fn forward(
        &mut self,
        _ctx: &ExecutionContext,
        _inputs: ArrayView4<f32>,
        _targets: ArrayView2<u32>,
    ) -> Result<ForwardOutput, ModelError> {
        Err(ModelError::Forward("scripted model cannot be trained".into()))
    }

    fn optimize(&mut self, _loss: f64) -> Result<(), ModelError> {
        Err(ModelError::Optimize("scripted model cannot be trained".into()))
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, "scripted").map_err(|source| ModelError::Checkpoint {
            path: path.to_path_buf(),
            source,
        })
    }
}

// =============================================================================
// LearningModel
// =============================================================================

/// A model whose logits favor the target token with a margin that grows
/// with every optimizer step, so its loss falls monotonically.
#[derive(Debug)]
pub struct LearningModel {
    vocab_size: usize,
    steps: usize,
    /// Every mode switch, in order.
    pub modes: Vec<ModelMode>,
    /// Number of forward passes.
    pub forward_calls: usize,
    /// Batch sizes seen by `forward`.
    pub batch_sizes: Vec<usize>,
    saves: Mutex<usize>,
}

impl LearningModel {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            steps: 0,
            modes: Vec::new(),
            forward_calls: 0,
            batch_sizes: Vec::new(),
            saves: Mutex::new(0),
        }
    }

    /// Optimizer steps taken.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or(0)
    }

    fn margin(&self) -> f32 {
        0.1 * (1 + self.steps) as f32
    }
}

impl SequenceModel for LearningModel {
    fn infer(
        &self,
        _ctx: &ExecutionContext,
        _input: &BundleTensor,
    ) -> Result<Vec<ScoredSequence>, ModelError> {
        Ok(Vec::new())
    }

    fn set_mode(&mut self, mode: ModelMode) {
        self.modes.push(mode);
    }

    fn forward(
        &mut self,
        _ctx: &ExecutionContext,
        inputs: ArrayView4<f32>,
        targets: ArrayView2<u32>,
    ) -> Result<ForwardOutput, ModelError> {
        let (b, l) = targets.dim();
        if inputs.shape()[0] != b || inputs.shape()[2] != 2 {
            return Err(ModelError::InputShape {
                expected: format!("({b}, N, 2, S)"),
                got: inputs.shape().to_vec(),
            });
        }
        if l < 2 {
            return Err(ModelError::Forward(format!("target length {l} leaves no steps")));
        }

        let margin = self.margin();
        let mut logits = Array3::<f32>::zeros((l - 1, b, self.vocab_size));
        for bi in 0..b {
            for t in 0..l - 1 {
                let target = targets[[bi, t + 1]] as usize;
                if target >= self.vocab_size {
                    return Err(ModelError::Forward(format!("token {target} outside vocabulary")));
                }
                logits[[t, bi, target]] = margin;
            }
        }
        self.forward_calls += 1;
        self.batch_sizes.push(b);
        Ok(ForwardOutput {
            logits,
            aux_loss: None,
        })
    }

    fn optimize(&mut self, loss: f64) -> Result<(), ModelError> {
        if !loss.is_finite() {
            return Err(ModelError::Optimize(format!("non-finite loss {loss}")));
        }
        self.steps += 1;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, format!("steps={}\n", self.steps)).map_err(|source| ModelError::Checkpoint {
            path: path.to_path_buf(),
            source,
        })?;
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
