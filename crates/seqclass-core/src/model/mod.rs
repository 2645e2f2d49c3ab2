//! Classifier seam and input shaping.
//!
//! The network itself is trained elsewhere and exported to ONNX; this module
//! describes what the run expects of it ([`NetSpec`]), turns samples into
//! input tensors and defines the [`Classifier`] trait the evaluation loop
//! drives.

pub mod onnx;

use ndarray::Array2;

use crate::config::{Architecture, DimensionMode, RunConfig};
use crate::dataset::Sample;
use crate::error::ModelError;

pub use onnx::OnnxClassifier;

/// Depth of the volume a volumetric network consumes.
pub const VOLUME_DEPTH: usize = 10;
/// Slice height the networks are trained on.
pub const INPUT_HEIGHT: usize = 200;
/// Slice width the networks are trained on.
pub const INPUT_WIDTH: usize = 200;

/// Expected topology and I/O of the loaded network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetSpec {
    pub architecture: Architecture,
    /// Input channels: the slice count for planar nets, 1 for volumetric
    pub in_channels: usize,
    pub mode: DimensionMode,
    /// Output scores per sample: 5, or 4 with OTHER excluded
    pub num_classes: usize,
}

impl NetSpec {
    pub fn new(
        architecture: Architecture,
        slices: usize,
        mode: DimensionMode,
        include_other: bool,
    ) -> Self {
        let in_channels = match mode {
            DimensionMode::Planar => slices,
            DimensionMode::Volumetric => 1,
        };
        let num_classes = crate::label::ClassSet::new(include_other).len();
        Self {
            architecture,
            in_channels,
            mode,
            num_classes,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.architecture,
            config.slices,
            config.mode,
            config.include_other,
        )
    }
}

/// Dense row-major f32 tensor handed to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn batch(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }
}

/// View `elements` values with `shape`, where one dimension may be `-1`
/// (inferred), mirroring tensor `view` semantics.
pub fn view_shape(elements: usize, shape: &[i64]) -> Result<Vec<usize>, ModelError> {
    let mismatch = || ModelError::ReshapeMismatch {
        elements,
        shape: shape.to_vec(),
    };

    let inferred = shape.iter().filter(|&&d| d == -1).count();
    if inferred > 1 || shape.iter().any(|&d| d < -1) {
        return Err(mismatch());
    }

    let known: usize = shape
        .iter()
        .filter(|&&d| d != -1)
        .map(|&d| d as usize)
        .product();

    let resolved: Vec<usize> = if inferred == 1 {
        if known == 0 || elements % known != 0 {
            return Err(mismatch());
        }
        shape
            .iter()
            .map(|&d| if d == -1 { elements / known } else { d as usize })
            .collect()
    } else {
        if known != elements {
            return Err(mismatch());
        }
        shape.iter().map(|&d| d as usize).collect()
    };

    Ok(resolved)
}

/// Build the network input for one sample. The sample is left untouched.
///
/// Planar: `(1, slices, height, width)`. Volumetric: the volume viewed as
/// `(-1, 1, 10, 200, 200)`.
pub fn shape_input(sample: &Sample, mode: DimensionMode) -> Result<InputTensor, ModelError> {
    let volume = &sample.volume;
    let data: Vec<f32> = volume.iter().copied().collect();

    let shape = match mode {
        DimensionMode::Planar => {
            let (slices, height, width) = volume.dim();
            vec![1, slices, height, width]
        }
        DimensionMode::Volumetric => view_shape(
            data.len(),
            &[
                -1,
                1,
                VOLUME_DEPTH as i64,
                INPUT_HEIGHT as i64,
                INPUT_WIDTH as i64,
            ],
        )?,
    };

    Ok(InputTensor { shape, data })
}

/// A trained network ready for inference.
pub trait Classifier: Send {
    fn spec(&self) -> &NetSpec;

    /// Forward pass without gradient tracking. Returns one row of class
    /// scores per batch element.
    fn forward(&mut self, input: &InputTensor) -> Result<Array2<f32>, ModelError>;
}
