//! In-memory fakes for the sample source and classifier (testing only)
//!
//! Provides `MemorySampleSource` and `ScriptedClassifier`, which satisfy the
//! trait contracts without DICOM files or model weights.

use std::collections::VecDeque;

use ndarray::{Array2, Array3};

use crate::dataset::{Sample, SampleSource};
use crate::error::{DatasetError, ModelError};
use crate::label::ClassLabel;
use crate::model::{Classifier, InputTensor, NetSpec};

// ---------------------------------------------------------------------------
// MemorySampleSource
// ---------------------------------------------------------------------------

enum Slot {
    Ready(Sample),
    Failing(String),
}

/// Sample source backed by a `Vec` of prepared samples.
#[derive(Default)]
pub struct MemorySampleSource {
    slots: Vec<Slot>,
}

impl MemorySampleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample with a small zero volume.
    pub fn with_sample(self, path: &str, label: Option<ClassLabel>) -> Self {
        self.with_volume(path, label, Array3::zeros((1, 2, 2)))
    }

    pub fn with_volume(mut self, path: &str, label: Option<ClassLabel>, volume: Array3<f32>) -> Self {
        self.slots.push(Slot::Ready(Sample {
            volume,
            label,
            path: path.to_string(),
        }));
        self
    }

    /// Append a slot whose load always fails.
    pub fn with_failure(mut self, path: &str) -> Self {
        self.slots.push(Slot::Failing(path.to_string()));
        self
    }
}

impl SampleSource for MemorySampleSource {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn load(&self, index: usize) -> Result<Sample, DatasetError> {
        match self.slots.get(index) {
            Some(Slot::Ready(sample)) => Ok(sample.clone()),
            Some(Slot::Failing(path)) => Err(DatasetError::Series {
                path: path.clone(),
                source: dicom_series::SeriesError::InsufficientSlices {
                    path: path.into(),
                    found: 0,
                    required: 1,
                },
            }),
            None => Err(DatasetError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedClassifier
// ---------------------------------------------------------------------------

/// Classifier that replays pre-set score matrices, one per forward call.
pub struct ScriptedClassifier {
    spec: NetSpec,
    script: VecDeque<Vec<Vec<f32>>>,
    inputs: Vec<Vec<usize>>,
}

impl ScriptedClassifier {
    pub fn new(spec: NetSpec) -> Self {
        Self {
            spec,
            script: VecDeque::new(),
            inputs: Vec::new(),
        }
    }

    /// Queue the scores returned by the next forward pass.
    pub fn then_scores(self, scores: Vec<f32>) -> Self {
        self.then_rows(vec![scores])
    }

    /// Queue a multi-row score matrix, one row per batch element.
    pub fn then_rows(mut self, rows: Vec<Vec<f32>>) -> Self {
        self.script.push_back(rows);
        self
    }

    /// Queue scores that make `label` the prediction.
    pub fn then_predict(self, label: ClassLabel) -> Self {
        let mut scores = vec![0.0; self.spec.num_classes];
        if let Some(slot) = scores.get_mut(label.index()) {
            *slot = 1.0;
        }
        self.then_scores(scores)
    }

    /// Input shapes seen so far, in call order.
    pub fn seen_shapes(&self) -> &[Vec<usize>] {
        &self.inputs
    }
}

impl Classifier for ScriptedClassifier {
    fn spec(&self) -> &NetSpec {
        &self.spec
    }

    fn forward(&mut self, input: &InputTensor) -> Result<Array2<f32>, ModelError> {
        self.inputs.push(input.shape.clone());
        let rows = self
            .script
            .pop_front()
            .ok_or_else(|| ModelError::Runtime("script exhausted".to_string()))?;
        let n_rows = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((n_rows, cols), flat).map_err(|e| ModelError::Runtime(e.to_string()))
    }
}
