//! Result rendering: the prediction JSON line, accuracy summary, elapsed time.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde_json::ser::Formatter;
use serde::{Deserialize, Serialize};

use crate::config::Architecture;
use crate::eval::{EvalCounters, Mismatch};
use crate::label::{ClassLabel, ClassSet};

/// Value object emitted for each series in the result JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: ClassLabel,
}

/// Insertion-ordered map of series path -> prediction.
///
/// Re-inserting a path replaces its prediction but keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionMap {
    entries: Vec<(String, ClassLabel)>,
    positions: HashMap<String, usize>,
}

impl PredictionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: String, label: ClassLabel) {
        match self.positions.get(&path) {
            Some(&pos) => self.entries[pos].1 = label,
            None => {
                self.positions.insert(path.clone(), self.entries.len());
                self.entries.push((path, label));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<ClassLabel> {
        self.positions.get(path).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassLabel)> {
        self.entries.iter().map(|(p, l)| (p.as_str(), *l))
    }

    /// Single-line JSON: `{"<path>": {"prediction": "<label>"}, ...}`.
    ///
    /// Items are separated by `", "`, keys by `": "`, and non-ASCII
    /// characters are written as `\uXXXX` escapes.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// One-line formatter with spaced separators and ASCII-only output.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

impl Serialize for PredictionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, label) in &self.entries {
            map.serialize_entry(path, &Prediction { prediction: *label })?;
        }
        map.end()
    }
}

/// Accuracy of one class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassAccuracy {
    pub label: ClassLabel,
    pub correct: u64,
    pub total: u64,
    pub accuracy: Option<f64>,
}

/// Aggregate accuracy figures, written on request with `--summary-out`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccuracySummary {
    pub schema_version: String,
    pub architecture: Architecture,
    pub model: String,
    pub evaluated: u64,
    pub labelled: u64,
    pub correct: u64,
    pub accuracy: Option<f64>,
    pub per_class: Vec<ClassAccuracy>,
    pub mismatches: Vec<Mismatch>,
}

impl AccuracySummary {
    pub fn from_counters(
        counters: &EvalCounters,
        classes: ClassSet,
        architecture: Architecture,
        model: &Path,
    ) -> Self {
        let per_class = classes
            .labels()
            .iter()
            .map(|&label| ClassAccuracy {
                label,
                correct: counters.correct_per_class[label.index()],
                total: counters.total_per_class[label.index()],
                accuracy: counters.class_accuracy(label),
            })
            .collect();

        Self {
            schema_version: "1.0".to_string(),
            architecture,
            model: model.display().to_string(),
            evaluated: counters.total + counters.unlabelled,
            labelled: counters.total,
            correct: counters.correct,
            accuracy: counters.accuracy(),
            per_class,
            mismatches: counters.mismatches.clone(),
        }
    }
}

/// Write the accuracy summary in pretty JSON format.
pub fn write_summary_json(path: &Path, summary: &AccuracySummary) -> Result<()> {
    let content = serde_json::to_string_pretty(summary).context("serialize accuracy summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Human-readable wall-clock duration, e.g. `1h 02m 03.456s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let secs_ms = ms % 60_000;
    format!(
        "{}h {:02}m {:02}.{:03}s",
        hours,
        minutes,
        secs_ms / 1000,
        secs_ms % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_empty_map_is_empty_object() {
        assert_eq!(PredictionMap::new().to_json_line().unwrap(), "{}");
    }

    #[test]
    fn test_json_line_shape_and_order() {
        let mut map = PredictionMap::new();
        map.insert("/data/z".to_string(), ClassLabel::T2);
        map.insert("/data/a".to_string(), ClassLabel::Flair);

        let line = map.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(
            line,
            r#"{"/data/z": {"prediction": "T2"}, "/data/a": {"prediction": "FLAIR"}}"#
        );

        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["/data/a"], json!({"prediction": "FLAIR"}));
    }

    #[test]
    fn test_json_line_escapes_non_ascii() {
        let mut map = PredictionMap::new();
        map.insert("/d/é".to_string(), ClassLabel::T2);
        map.insert("/d/𝄞".to_string(), ClassLabel::T1);
        map.insert("/d/\"q\"".to_string(), ClassLabel::Other);

        let line = map.to_json_line().unwrap();
        assert!(line.is_ascii());
        assert_eq!(
            line,
            r#"{"/d/\u00e9": {"prediction": "T2"}, "/d/\ud834\udd1e": {"prediction": "T1"}, "/d/\"q\"": {"prediction": "OTHER"}}"#
        );

        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["/d/é"], json!({"prediction": "T2"}));
        assert_eq!(v["/d/𝄞"], json!({"prediction": "T1"}));
    }

    #[test]
    fn test_reinsert_keeps_first_position() {
        let mut map = PredictionMap::new();
        map.insert("a".to_string(), ClassLabel::T1);
        map.insert("b".to_string(), ClassLabel::T1);
        map.insert("a".to_string(), ClassLabel::T1c);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(ClassLabel::T1c));
        let keys: Vec<_> = map.iter().map(|(p, _)| p).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_summary_from_counters() {
        let mut counters = EvalCounters::new();
        counters.record("a", Some(ClassLabel::T1), ClassLabel::T1);
        counters.record("b", Some(ClassLabel::T2), ClassLabel::T1);
        counters.record("c", None, ClassLabel::Flair);

        let summary = AccuracySummary::from_counters(
            &counters,
            ClassSet::new(false),
            Architecture::Resnet18,
            Path::new("models/net.onnx"),
        );
        assert_eq!(summary.evaluated, 3);
        assert_eq!(summary.labelled, 2);
        assert_eq!(summary.accuracy, Some(0.5));
        assert_eq!(summary.per_class.len(), 4);
        assert_eq!(summary.mismatches.len(), 1);

        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["architecture"], "resnet18");
        assert_eq!(v["per_class"][1]["label"], "T1");
    }

    #[test]
    fn test_write_summary_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = AccuracySummary::from_counters(
            &EvalCounters::new(),
            ClassSet::default(),
            Architecture::Vgg,
            Path::new("models/vgg.onnx"),
        );
        write_summary_json(&path, &summary).unwrap();

        let back: AccuracySummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, summary);
        assert_eq!(back.accuracy, None);
    }

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0h 00m 00.000s");
        assert_eq!(format_elapsed(Duration::from_millis(3_723_456)), "1h 02m 03.456s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "0h 00m 59.000s");
    }
}
