//! Series dataset: ordered entries with inferred labels, loaded on demand.

use std::path::Path;

use dicom_series::{load_series, SeriesOptions};
use ndarray::Array3;
use tracing::debug;

use crate::error::DatasetError;
use crate::label::ClassLabel;

/// One classification input.
///
/// Produced by a [`SampleSource`] and never modified afterwards.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Shape (slices, height, width)
    pub volume: Array3<f32>,
    /// Ground truth, when the series location names a class
    pub label: Option<ClassLabel>,
    /// Series path exactly as given on input
    pub path: String,
}

/// Random-access source of samples.
pub trait SampleSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the sample at `index`. Called from loader worker threads.
    fn load(&self, index: usize) -> Result<Sample, DatasetError>;
}

/// A series directory queued for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEntry {
    pub path: String,
    pub label: Option<ClassLabel>,
}

impl SeriesEntry {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let label = infer_label(Path::new(&path));
        Self { path, label }
    }
}

/// Infer a ground-truth label from the series directory name or its parent
/// directory name (`.../T1c/series_04` or `.../series_04/T1c`).
pub fn infer_label(path: &Path) -> Option<ClassLabel> {
    let own = path.file_name();
    let parent = path.parent().and_then(Path::file_name);
    [own, parent]
        .into_iter()
        .flatten()
        .filter_map(|name| name.to_str())
        .find_map(|name| name.parse::<ClassLabel>().ok())
}

/// Dataset over DICOM series directories.
#[derive(Debug, Clone)]
pub struct SeriesDataset {
    entries: Vec<SeriesEntry>,
    options: SeriesOptions,
}

impl SeriesDataset {
    /// Build the dataset. With `include_other == false`, series labelled
    /// OTHER are dropped.
    pub fn new(paths: Vec<String>, options: SeriesOptions, include_other: bool) -> Self {
        let entries = paths
            .into_iter()
            .map(SeriesEntry::new)
            .filter(|entry| {
                let keep = include_other || entry.label != Some(ClassLabel::Other);
                if !keep {
                    debug!(path = %entry.path, "excluding OTHER series");
                }
                keep
            })
            .collect();
        Self { entries, options }
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn options(&self) -> &SeriesOptions {
        &self.options
    }
}

impl SampleSource for SeriesDataset {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn load(&self, index: usize) -> Result<Sample, DatasetError> {
        let entry = self
            .entries
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })?;

        let volume =
            load_series(Path::new(&entry.path), &self.options).map_err(|source| {
                DatasetError::Series {
                    path: entry.path.clone(),
                    source,
                }
            })?;

        Ok(Sample {
            volume: volume.data,
            label: entry.label,
            path: entry.path.clone(),
        })
    }
}
