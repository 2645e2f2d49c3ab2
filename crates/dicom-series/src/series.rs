//! Series assembly: directory of slice files -> fixed-size volume.

use std::ops::Range;
use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use tracing::debug;

use crate::resample::{normalize_unit, resize_bilinear};
use crate::slice::{order_slices, read_slices, SliceImage};
use crate::{Result, SeriesError};

/// How a series is reduced to a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesOptions {
    /// Number of central slices kept
    pub slices: usize,
    /// Output slice height
    pub height: usize,
    /// Output slice width
    pub width: usize,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            slices: 10,
            height: 200,
            width: 200,
        }
    }
}

/// Central slices of a series, resampled and normalised.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Shape (slices, height, width), values in [0, 1]
    pub data: Array3<f32>,
    /// Number of slices the series contained before selection
    pub available: usize,
}

/// List the candidate slice files of a series directory, sorted by name.
///
/// Hidden files and subdirectories are skipped.
pub fn list_series_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SeriesError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let hidden = entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

/// Index range of the `wanted` central items out of `count`.
///
/// Returns `None` when fewer than `wanted` items are available.
pub fn central_range(count: usize, wanted: usize) -> Option<Range<usize>> {
    if count < wanted {
        return None;
    }
    let start = (count - wanted) / 2;
    Some(start..start + wanted)
}

/// Load the series stored in `dir` as a normalised volume.
pub fn load_series(dir: &Path, options: &SeriesOptions) -> Result<Volume> {
    let files = list_series_files(dir)?;

    let mut slices: Vec<SliceImage> = Vec::new();
    for file in &files {
        match read_slices(file) {
            Ok(mut found) => slices.append(&mut found),
            Err(e @ (SeriesError::Dicom { .. } | SeriesError::MissingAttribute { .. })) => {
                debug!(file = %file.display(), error = %e, "skipping non-image file");
            }
            Err(e) => return Err(e),
        }
    }

    let available = slices.len();
    let range = central_range(available, options.slices).ok_or_else(|| {
        SeriesError::InsufficientSlices {
            path: dir.to_path_buf(),
            found: available,
            required: options.slices,
        }
    })?;

    order_slices(&mut slices);

    let mut data = Array3::<f32>::zeros((options.slices, options.height, options.width));
    for (out_idx, slice) in slices[range].iter().enumerate() {
        let resized = resize_bilinear(&slice.pixels, options.height, options.width)?;
        data.index_axis_mut(Axis(0), out_idx).assign(&resized);
    }
    normalize_unit(&mut data);

    debug!(
        series = %dir.display(),
        available,
        kept = options.slices,
        "series loaded"
    );

    Ok(Volume { data, available })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_range_odd_remainder() {
        assert_eq!(central_range(15, 10), Some(2..12));
        assert_eq!(central_range(10, 10), Some(0..10));
        assert_eq!(central_range(11, 10), Some(0..10));
    }

    #[test]
    fn test_central_range_insufficient() {
        assert_eq!(central_range(9, 10), None);
        assert_eq!(central_range(0, 0), Some(0..0));
    }

    #[test]
    fn test_list_skips_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.dcm"), b"x").unwrap();
        std::fs::write(dir.path().join("a.dcm"), b"x").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list_series_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.dcm", "b.dcm"]);
    }

    #[test]
    fn test_missing_directory() {
        let err = load_series(Path::new("/nonexistent/series"), &SeriesOptions::default())
            .unwrap_err();
        assert!(matches!(err, SeriesError::NotADirectory(_)));
    }

    #[test]
    fn test_empty_directory_has_no_slices() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_series(dir.path(), &SeriesOptions::default()).unwrap_err();
        match err {
            SeriesError::InsufficientSlices {
                found, required, ..
            } => {
                assert_eq!(found, 0);
                assert_eq!(required, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
