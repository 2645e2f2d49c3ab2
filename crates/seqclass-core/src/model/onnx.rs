//! ONNX Runtime backend.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::{Classifier, InputTensor, NetSpec};
use crate::determinism::{ExecutionPolicy, OptimizationLevel};
use crate::error::ModelError;

/// Classifier backed by an ONNX export of the trained network.
pub struct OnnxClassifier {
    session: Session,
    spec: NetSpec,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load weights from `path` and build an inference session under `policy`.
    pub fn load(path: &Path, spec: NetSpec, policy: &ExecutionPolicy) -> Result<Self, ModelError> {
        if !path.is_file() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(optimization_level(policy.optimization)))
            .and_then(|b| b.with_intra_threads(policy.intra_threads))
            .and_then(|b| b.with_parallel_execution(policy.parallel_execution))
            .and_then(|b| b.commit_from_file(path))
            .map_err(runtime)?;

        info!(
            model = %path.display(),
            architecture = %spec.architecture,
            in_channels = spec.in_channels,
            num_classes = spec.num_classes,
            deterministic = policy.is_deterministic(),
            "model loaded"
        );

        Ok(Self {
            session,
            spec,
            model_path: path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Classifier for OnnxClassifier {
    fn spec(&self) -> &NetSpec {
        &self.spec
    }

    fn forward(&mut self, input: &InputTensor) -> Result<Array2<f32>, ModelError> {
        let tensor =
            Tensor::from_array((input.shape.clone(), input.data.clone())).map_err(runtime)?;
        let outputs = self.session.run(ort::inputs![tensor]).map_err(runtime)?;

        let (_name, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::Runtime("model produced no outputs".to_string()))?;
        let (shape, data) = value.try_extract_tensor::<f32>().map_err(runtime)?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let (rows, cols) = match dims.as_slice() {
            [cols] => (1, *cols),
            [rows, cols] => (*rows, *cols),
            other => {
                return Err(ModelError::Runtime(format!(
                    "expected a (batch, classes) score tensor, got shape {other:?}"
                )))
            }
        };
        debug!(input_shape = ?input.shape, rows, cols, "forward pass");

        if cols != self.spec.num_classes {
            return Err(ModelError::OutputMismatch {
                expected: self.spec.num_classes,
                actual: cols,
            });
        }

        Array2::from_shape_vec((rows, cols), data.to_vec())
            .map_err(|e| ModelError::Runtime(e.to_string()))
    }
}

fn optimization_level(level: OptimizationLevel) -> GraphOptimizationLevel {
    match level {
        OptimizationLevel::Disabled => GraphOptimizationLevel::Disable,
        OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
        OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
        OptimizationLevel::All => GraphOptimizationLevel::Level3,
    }
}

fn runtime(err: impl std::fmt::Display) -> ModelError {
    ModelError::Runtime(err.to_string())
}
