//! Run configuration.
//!
//! A [`RunConfig`] is resolved once from the command line and never mutated
//! afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::label::ClassSet;

/// Default number of central slices per series.
pub const DEFAULT_SLICES: usize = 10;

/// Default directory model files are resolved against.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Default number of concurrent series loads.
pub const DEFAULT_WORKERS: usize = 8;

/// Network topologies a trained model may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Resnet18,
    Alexnet,
    Vgg,
    Squeezenet,
    Mobilenet,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::Resnet18,
        Architecture::Alexnet,
        Architecture::Vgg,
        Architecture::Squeezenet,
        Architecture::Mobilenet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Resnet18 => "resnet18",
            Architecture::Alexnet => "alexnet",
            Architecture::Vgg => "vgg",
            Architecture::Squeezenet => "squeezenet",
            Architecture::Mobilenet => "mobilenet",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ConfigError;

    /// Exact, case-sensitive match against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownArchitecture(s.to_string()))
    }
}

/// Whether the network convolves slices as channels or as a 3D volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionMode {
    /// Slices stacked as input channels
    #[default]
    Planar,
    /// Single-channel depth x height x width volume
    Volumetric,
}

impl DimensionMode {
    pub fn from_tridim(tridim: bool) -> Self {
        if tridim {
            DimensionMode::Volumetric
        } else {
            DimensionMode::Planar
        }
    }
}

/// Where the series directories come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Text file listing one series directory per line
    ListFile(PathBuf),
    /// Directories given directly
    SeriesPaths(Vec<String>),
}

impl InputSource {
    /// Resolve to the ordered list of series paths.
    pub fn resolve(&self) -> Result<Vec<String>, ConfigError> {
        match self {
            InputSource::ListFile(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::ListFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(parse_series_list(&content))
            }
            InputSource::SeriesPaths(paths) => Ok(paths.clone()),
        }
    }
}

/// Parse a series list: one path per line, line endings stripped, blank
/// lines ignored.
pub fn parse_series_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Fully resolved options for one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub series_paths: Vec<String>,
    pub architecture: Architecture,
    pub slices: usize,
    pub mode: DimensionMode,
    pub include_other: bool,
    pub model_path: PathBuf,
    pub debug: bool,
    pub workers: usize,
}

impl RunConfig {
    /// Validate and assemble a run configuration.
    ///
    /// `model_file` is resolved relative to `models_dir`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        series_paths: Vec<String>,
        architecture: Architecture,
        slices: usize,
        mode: DimensionMode,
        include_other: bool,
        models_dir: &Path,
        model_file: &str,
        debug: bool,
        workers: usize,
    ) -> Result<Self, ConfigError> {
        if slices == 0 {
            return Err(ConfigError::ZeroSlices);
        }
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if model_file.trim().is_empty() {
            return Err(ConfigError::EmptyModelFile);
        }

        Ok(Self {
            series_paths,
            architecture,
            slices,
            mode,
            include_other,
            model_path: models_dir.join(model_file),
            debug,
            workers,
        })
    }

    pub fn class_set(&self) -> ClassSet {
        ClassSet::new(self.include_other)
    }
}
