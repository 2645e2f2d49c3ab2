//! Reproducible execution settings for the inference runtime.
//!
//! Nothing in the pipeline samples randomly; run-to-run variation can only
//! come from the order of floating-point reductions, which depends on how
//! the runtime splits work across threads. Pinning execution to one thread
//! with sequential graph scheduling makes repeated runs bitwise identical.

use serde::{Deserialize, Serialize};

/// Graph optimisation level applied when building a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationLevel {
    Disabled,
    Basic,
    Extended,
    All,
}

/// Runtime execution settings applied to every model session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Threads used inside a single operator
    pub intra_threads: usize,
    /// Run independent graph branches concurrently
    pub parallel_execution: bool,
    pub optimization: OptimizationLevel,
}

impl ExecutionPolicy {
    /// Single-threaded, sequential, fixed optimisation level.
    pub fn deterministic() -> Self {
        Self {
            intra_threads: 1,
            parallel_execution: false,
            optimization: OptimizationLevel::All,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        self.intra_threads == 1 && !self.parallel_execution
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::deterministic()
    }
}
