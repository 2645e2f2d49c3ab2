//! Error taxonomy for seqclass-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown architecture '{0}' (expected one of: resnet18, alexnet, vgg, squeezenet, mobilenet)")]
    UnknownArchitecture(String),

    #[error("unknown class label '{0}'")]
    UnknownLabel(String),

    #[error("slice count must be at least 1")]
    ZeroSlices,

    #[error("loader worker count must be at least 1")]
    ZeroWorkers,

    #[error("model file name must not be empty")]
    EmptyModelFile,

    #[error("failed to read series list {path}: {source}")]
    ListFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while producing samples.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("sample index {index} out of range (dataset has {len} samples)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to load series {path}: {source}")]
    Series {
        path: String,
        #[source]
        source: dicom_series::SeriesError,
    },

    #[error("loader worker failed: {0}")]
    Worker(String),
}

/// Errors raised by the inference backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("inference runtime error: {0}")]
    Runtime(String),

    #[error("cannot view {elements} elements as shape {shape:?}")]
    ReshapeMismatch { elements: usize, shape: Vec<i64> },

    #[error("model produced {actual} scores per sample, expected {expected}")]
    OutputMismatch { expected: usize, actual: usize },
}

/// Top-level evaluation errors.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("predicted class index {index} outside the {classes}-class set")]
    LabelOutOfRange { index: usize, classes: usize },

    #[error("model returned an empty score row for {0}")]
    EmptyScores(String),

    #[error("model returned {rows} score rows for {path}, expected exactly one")]
    BatchMismatch { path: String, rows: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for seqclass-core operations.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_architecture_lists_allowed_names() {
        let err = ConfigError::UnknownArchitecture("densenet".to_string());
        let msg = err.to_string();
        assert!(msg.contains("densenet"));
        assert!(msg.contains("resnet18"));
        assert!(msg.contains("mobilenet"));
    }

    #[test]
    fn test_model_error_wraps_into_eval_error() {
        let err: EvalError = ModelError::OutputMismatch {
            expected: 5,
            actual: 4,
        }
        .into();
        assert!(err.to_string().starts_with("model error"));
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn test_batch_mismatch_names_path_and_rows() {
        let err = EvalError::BatchMismatch {
            path: "/d/T1/vol20".to_string(),
            rows: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("/d/T1/vol20"));
        assert!(msg.contains("2 score rows"));
    }

    #[test]
    fn test_reshape_mismatch_display() {
        let err = ModelError::ReshapeMismatch {
            elements: 12,
            shape: vec![-1, 1, 10, 200, 200],
        };
        assert!(err.to_string().contains("12 elements"));
    }
}
