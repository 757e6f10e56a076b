//! Explicit execution target shared by the surrogate and the sequence model.
//!
//! Nothing in the crate picks a device on its own: callers build an
//! [`ExecutionContext`] once and hand it to every component that talks to an
//! accelerator-backed collaborator.

use std::fmt;

/// Hardware target for collaborator calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA device by ordinal.
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(i) => write!(f, "cuda:{}", i),
        }
    }
}

/// Execution context passed to collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    pub device: Device,
    /// Maximum rows per surrogate evaluation call. `0` means unbounded.
    pub evaluation_batch_size: usize,
}

impl ExecutionContext {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            evaluation_batch_size: 0,
        }
    }

    pub fn cpu() -> Self {
        Self::new(Device::Cpu)
    }

    pub fn with_evaluation_batch_size(mut self, batch_size: usize) -> Self {
        self.evaluation_batch_size = batch_size;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::cpu()
    }
}
