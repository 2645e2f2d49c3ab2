//! dicom-series: DICOM series reading for seqclass
//!
//! Turns a directory of DICOM slice files into a fixed-size volume that a
//! classifier can consume.
//!
//! ## Layer 0 - Data
//!
//! Focus: decoding pixel data, ordering slices, and resampling.
//!
//! ## Key Components
//!
//! - `read_slices`: decode the slices stored in one DICOM P10 file
//! - `load_series`: assemble the central slices of a series into a `Volume`
//! - `resize_bilinear`: resample a slice to the network input size

mod error;
pub mod resample;
pub mod series;
pub mod slice;

pub use error::SeriesError;
pub use resample::{normalize_unit, resize_bilinear};
pub use series::{central_range, list_series_files, load_series, SeriesOptions, Volume};
pub use slice::{order_slices, read_slices, SliceImage};

/// Result type for dicom-series operations
pub type Result<T> = std::result::Result<T, SeriesError>;
