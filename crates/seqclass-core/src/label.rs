//! Sequence class labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// MRI sequence type predicted by the classifier.
///
/// Variant order is the network's output index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassLabel {
    #[serde(rename = "FLAIR")]
    Flair,
    #[serde(rename = "T1")]
    T1,
    #[serde(rename = "T1c")]
    T1c,
    #[serde(rename = "T2")]
    T2,
    #[serde(rename = "OTHER")]
    Other,
}

impl ClassLabel {
    /// All labels in output index order.
    pub const ALL: [ClassLabel; 5] = [
        ClassLabel::Flair,
        ClassLabel::T1,
        ClassLabel::T1c,
        ClassLabel::T2,
        ClassLabel::Other,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical name, as emitted in the prediction JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassLabel::Flair => "FLAIR",
            ClassLabel::T1 => "T1",
            ClassLabel::T1c => "T1c",
            ClassLabel::T2 => "T2",
            ClassLabel::Other => "OTHER",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassLabel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownLabel(s.to_string()))
    }
}

/// The classes a run considers: all five, or four with OTHER excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSet {
    include_other: bool,
}

impl ClassSet {
    pub fn new(include_other: bool) -> Self {
        Self { include_other }
    }

    pub fn include_other(&self) -> bool {
        self.include_other
    }

    pub fn len(&self) -> usize {
        if self.include_other {
            ClassLabel::ALL.len()
        } else {
            ClassLabel::ALL.len() - 1
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn labels(&self) -> &'static [ClassLabel] {
        &ClassLabel::ALL[..self.len()]
    }

    pub fn contains(&self, label: ClassLabel) -> bool {
        self.labels().contains(&label)
    }

    /// Label for a network output index, if the index is inside this set.
    pub fn label_at(&self, index: usize) -> Option<ClassLabel> {
        self.labels().get(index).copied()
    }
}

impl Default for ClassSet {
    fn default() -> Self {
        Self::new(true)
    }
}
