//! Evaluation loop and accuracy bookkeeping.

use futures::{pin_mut, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DimensionMode;
use crate::dataset::Sample;
use crate::error::{DatasetError, EvalError, Result};
use crate::label::{ClassLabel, ClassSet};
use crate::model::{shape_input, Classifier};
use crate::obs;
use crate::report::PredictionMap;

/// Index of the first maximal score.
///
/// NaN scores are skipped; if every score is NaN the first index wins.
/// Returns `None` only for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    Some(best.map_or(0, |(i, _)| i))
}

/// A labelled sample the network got wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub path: String,
    pub actual: ClassLabel,
    pub predicted: ClassLabel,
}

/// Run-scoped correctness totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCounters {
    pub total: u64,
    pub correct: u64,
    /// Samples with no ground-truth label (not part of `total`)
    pub unlabelled: u64,
    pub total_per_class: [u64; 5],
    pub correct_per_class: [u64; 5],
    pub mismatches: Vec<Mismatch>,
}

impl EvalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one prediction.
    pub fn record(&mut self, path: &str, actual: Option<ClassLabel>, predicted: ClassLabel) {
        let Some(actual) = actual else {
            self.unlabelled += 1;
            return;
        };

        self.total += 1;
        self.total_per_class[actual.index()] += 1;
        if actual == predicted {
            self.correct += 1;
            self.correct_per_class[actual.index()] += 1;
        } else {
            self.mismatches.push(Mismatch {
                path: path.to_string(),
                actual,
                predicted,
            });
        }
    }

    /// Overall accuracy, `None` if nothing labelled was seen.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.correct, self.total)
    }

    pub fn class_accuracy(&self, label: ClassLabel) -> Option<f64> {
        ratio(
            self.correct_per_class[label.index()],
            self.total_per_class[label.index()],
        )
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Result of a completed evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalOutcome {
    pub predictions: PredictionMap,
    pub counters: EvalCounters,
}

/// Drives a classifier over a stream of samples.
pub struct Evaluator<C: Classifier> {
    classifier: C,
    classes: ClassSet,
    mode: DimensionMode,
}

impl<C: Classifier> Evaluator<C> {
    pub fn new(classifier: C, classes: ClassSet, mode: DimensionMode) -> Self {
        Self {
            classifier,
            classes,
            mode,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Predict the label of one sample.
    pub fn predict(&mut self, sample: &Sample) -> Result<ClassLabel> {
        let input = shape_input(sample, self.mode)?;
        let scores = self.classifier.forward(&input)?;

        // Exactly one score row per sample.
        if scores.nrows() != 1 {
            return Err(EvalError::BatchMismatch {
                path: sample.path.clone(),
                rows: scores.nrows(),
            });
        }
        let row = scores.row(0).to_vec();
        let index = argmax(&row).ok_or_else(|| EvalError::EmptyScores(sample.path.clone()))?;

        self.classes
            .label_at(index)
            .ok_or(EvalError::LabelOutOfRange {
                index,
                classes: self.classes.len(),
            })
    }

    /// Consume `samples` in order, predicting each one.
    ///
    /// `expected` is only used for progress logging. The first error aborts
    /// the run and discards partial results.
    pub async fn run<S>(&mut self, samples: S, expected: usize) -> Result<EvalOutcome>
    where
        S: Stream<Item = std::result::Result<Sample, DatasetError>>,
    {
        pin_mut!(samples);

        let mut outcome = EvalOutcome::default();
        let mut tested = 0usize;

        while let Some(sample) = samples.next().await {
            let sample = sample?;
            let predicted = self.predict(&sample)?;

            outcome.counters.record(&sample.path, sample.label, predicted);
            outcome.predictions.insert(sample.path.clone(), predicted);

            tested += 1;
            obs::emit_sample_evaluated(tested, &sample.path, sample.label, predicted);
            debug!("{{\"prediction\": \"{}\"}}", predicted);
            debug!("Tested {} of {} files", tested, expected);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[3.0]), Some(0));
        assert_eq!(argmax(&[-5.0, -1.0, -3.0]), Some(1));
    }

    #[test]
    fn test_argmax_nan_handling() {
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.9]), Some(2));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_counters_track_correct_and_mismatches() {
        let mut c = EvalCounters::new();
        c.record("a", Some(ClassLabel::T1), ClassLabel::T1);
        c.record("b", Some(ClassLabel::T1), ClassLabel::T2);
        c.record("c", Some(ClassLabel::Flair), ClassLabel::Flair);
        c.record("d", None, ClassLabel::T2);

        assert_eq!(c.total, 3);
        assert_eq!(c.correct, 2);
        assert_eq!(c.unlabelled, 1);
        assert_eq!(c.total_per_class[ClassLabel::T1.index()], 2);
        assert_eq!(c.correct_per_class[ClassLabel::T1.index()], 1);
        assert_eq!(
            c.mismatches,
            vec![Mismatch {
                path: "b".to_string(),
                actual: ClassLabel::T1,
                predicted: ClassLabel::T2,
            }]
        );
        assert_eq!(c.class_accuracy(ClassLabel::T1), Some(0.5));
        assert_eq!(c.class_accuracy(ClassLabel::T2), None);
    }

    #[test]
    fn test_accuracy_none_without_labels() {
        let mut c = EvalCounters::new();
        assert_eq!(c.accuracy(), None);
        c.record("x", None, ClassLabel::Other);
        assert_eq!(c.accuracy(), None);
    }
}
