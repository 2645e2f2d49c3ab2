//! Error types for dicom-series

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a DICOM series
#[derive(Error, Debug)]
pub enum SeriesError {
    /// Series path is missing or is not a directory
    #[error("Series path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File could not be parsed as DICOM P10
    #[error("Invalid DICOM file {path}: {message}")]
    Dicom { path: PathBuf, message: String },

    /// A required attribute is absent or unreadable
    #[error("Missing attribute {attribute} in {path}")]
    MissingAttribute {
        path: PathBuf,
        attribute: &'static str,
    },

    /// Pixel data layout this reader does not decode
    #[error("Unsupported pixel data in {path}: {reason}")]
    UnsupportedPixelData { path: PathBuf, reason: String },

    /// Fewer usable slices than the requested central range
    #[error("Series {path} has {found} slices, {required} required")]
    InsufficientSlices {
        path: PathBuf,
        found: usize,
        required: usize,
    },

    /// Zero-sized image or target size
    #[error("Image dimensions must be non-zero")]
    EmptyImage,
}
