//! Single-file slice decoding.
//!
//! Only native (uncompressed) little-endian pixel data is decoded. Each frame
//! of a multi-frame file becomes its own [`SliceImage`].

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use dcmfx::core::*;
use dcmfx::p10::*;
use dcmfx::pixel_data::*;
use ndarray::Array2;

use crate::{Result, SeriesError};

/// One decoded 2D slice of a series.
#[derive(Debug, Clone)]
pub struct SliceImage {
    /// File the slice was read from
    pub source: PathBuf,
    /// Frame index within `source` (0 for single-frame files)
    pub frame: usize,
    /// InstanceNumber (0020,0013), if present
    pub instance_number: Option<i64>,
    /// SliceLocation (0020,1041), if present
    pub slice_location: Option<f64>,
    /// Rescaled intensities, rows x columns
    pub pixels: Array2<f32>,
}

/// Pixel layout attributes needed to decode a native frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PixelLayout {
    pub rows: usize,
    pub columns: usize,
    pub bits_allocated: u16,
    pub signed: bool,
    pub slope: f32,
    pub intercept: f32,
    pub invert: bool,
}

impl PixelLayout {
    fn frame_len(&self) -> usize {
        self.rows * self.columns * usize::from(self.bits_allocated / 8)
    }
}

/// Read every slice stored in the DICOM P10 file at `path`.
pub fn read_slices(path: &Path) -> Result<Vec<SliceImage>> {
    let path_str = path.to_string_lossy();
    let ds = DataSet::read_p10_file(&path_str).map_err(|e| SeriesError::Dicom {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;

    let rows: i64 = ds
        .get_int(dictionary::ROWS.tag)
        .map_err(|_| missing(path, "Rows"))?;
    let columns: i64 = ds
        .get_int(dictionary::COLUMNS.tag)
        .map_err(|_| missing(path, "Columns"))?;
    let bits_allocated: i64 = ds
        .get_int(dictionary::BITS_ALLOCATED.tag)
        .map_err(|_| missing(path, "BitsAllocated"))?;
    let pixel_representation: i64 = ds.get_int(dictionary::PIXEL_REPRESENTATION.tag).unwrap_or(0);
    let samples_per_pixel: i64 = ds.get_int(dictionary::SAMPLES_PER_PIXEL.tag).unwrap_or(1);

    if samples_per_pixel != 1 {
        return Err(SeriesError::UnsupportedPixelData {
            path: path.to_path_buf(),
            reason: format!("{samples_per_pixel} samples per pixel"),
        });
    }
    if bits_allocated != 8 && bits_allocated != 16 {
        return Err(SeriesError::UnsupportedPixelData {
            path: path.to_path_buf(),
            reason: format!("{bits_allocated} bits allocated"),
        });
    }
    if rows <= 0 || columns <= 0 {
        return Err(SeriesError::EmptyImage);
    }

    let photometric = ds
        .get_string(dictionary::PHOTOMETRIC_INTERPRETATION.tag)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let layout = PixelLayout {
        rows: rows as usize,
        columns: columns as usize,
        bits_allocated: bits_allocated as u16,
        signed: pixel_representation == 1,
        slope: decimal(&ds, dictionary::RESCALE_SLOPE.tag).unwrap_or(1.0) as f32,
        intercept: decimal(&ds, dictionary::RESCALE_INTERCEPT.tag).unwrap_or(0.0) as f32,
        invert: photometric == "MONOCHROME1",
    };

    let instance_number = decimal(&ds, dictionary::INSTANCE_NUMBER.tag).map(|v| v as i64);
    let slice_location = decimal(&ds, dictionary::SLICE_LOCATION.tag);

    let (_vr, frames) = ds.get_pixel_data().map_err(|_| missing(path, "PixelData"))?;

    let mut slices = Vec::new();
    for (frame, fragments) in frames.iter().enumerate() {
        let mut bytes = Vec::with_capacity(layout.frame_len());
        for fragment in fragments.iter() {
            bytes.extend_from_slice(&fragment[..]);
        }
        let pixels = decode_native_frame(&bytes, &layout).map_err(|reason| {
            SeriesError::UnsupportedPixelData {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        slices.push(SliceImage {
            source: path.to_path_buf(),
            frame,
            instance_number,
            slice_location,
            pixels,
        });
    }

    Ok(slices)
}

fn missing(path: &Path, attribute: &'static str) -> SeriesError {
    SeriesError::MissingAttribute {
        path: path.to_path_buf(),
        attribute,
    }
}

/// IS/DS attributes are stored as text; parse them leniently.
fn decimal(ds: &DataSet, tag: DataElementTag) -> Option<f64> {
    ds.get_string(tag)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
}

/// Decode one native little-endian frame into rescaled intensities.
///
/// Trailing padding bytes are ignored; a short buffer is an error (this is
/// also how encapsulated transfer syntaxes are rejected).
pub(crate) fn decode_native_frame(
    bytes: &[u8],
    layout: &PixelLayout,
) -> std::result::Result<Array2<f32>, String> {
    let expected = layout.frame_len();
    if bytes.len() < expected {
        return Err(format!(
            "frame holds {} bytes, {} expected (compressed transfer syntax?)",
            bytes.len(),
            expected
        ));
    }

    let count = layout.rows * layout.columns;
    let raw: Vec<f32> = match (layout.bits_allocated, layout.signed) {
        (8, false) => bytes[..count].iter().map(|&b| f32::from(b)).collect(),
        (8, true) => bytes[..count].iter().map(|&b| f32::from(b as i8)).collect(),
        (16, false) => bytes[..count * 2]
            .chunks_exact(2)
            .map(|c| f32::from(u16::from_le_bytes([c[0], c[1]])))
            .collect(),
        (16, true) => bytes[..count * 2]
            .chunks_exact(2)
            .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])))
            .collect(),
        (bits, _) => return Err(format!("{bits} bits allocated")),
    };

    let mut values: Vec<f32> = raw
        .into_iter()
        .map(|v| v * layout.slope + layout.intercept)
        .collect();

    if layout.invert {
        let (lo, hi) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        for v in &mut values {
            *v = hi + lo - *v;
        }
    }

    Array2::from_shape_vec((layout.rows, layout.columns), values).map_err(|e| e.to_string())
}

/// Sort slices into acquisition order.
///
/// Keys, in priority: InstanceNumber, SliceLocation, source path, frame.
/// A slice lacking a key sorts after slices that have it.
pub fn order_slices(slices: &mut [SliceImage]) {
    slices.sort_by(|a, b| {
        cmp_present(a.instance_number, b.instance_number)
            .then_with(|| cmp_present(a.slice_location, b.slice_location))
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.frame.cmp(&b.frame))
    });
}

fn cmp_present<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
