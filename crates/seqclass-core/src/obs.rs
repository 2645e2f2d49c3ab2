//! Structured observability hooks for evaluation runs.
//!
//! This module provides:
//! - A run-scoped tracing span, attached to the run future with `Instrument`
//! - Emission functions for lifecycle events: start, per-sample, finish, summary
//!
//! Run-level events are emitted at `info!`, per-sample events at `debug!`.
//! Verbosity follows `RUST_LOG` when set.

use tracing::{debug, info, Span};

use crate::eval::EvalCounters;
use crate::label::ClassLabel;

/// Run-scoped span. Attach it to the run future rather than entering it:
///
/// ```ignore
/// use tracing::Instrument;
/// evaluate(config).instrument(run_span("resnet18_10.onnx")).await
/// // every event inside carries model = "resnet18_10.onnx"
/// ```
pub fn run_span(model: &str) -> Span {
    tracing::info_span!("seqclass.eval", model = %model)
}

/// Emit event: evaluation started.
pub fn emit_eval_started(architecture: &str, samples: usize, workers: usize) {
    info!(
        event = "eval.started",
        architecture = %architecture,
        samples = samples,
        workers = workers,
    );
}

/// Emit event: one sample classified.
pub fn emit_sample_evaluated(seq: usize, path: &str, actual: Option<ClassLabel>, predicted: ClassLabel) {
    debug!(
        event = "eval.sample",
        seq = seq,
        path = %path,
        actual = actual.map(ClassLabel::as_str).unwrap_or("unknown"),
        predicted = %predicted,
    );
}

/// Emit event: evaluation finished.
pub fn emit_eval_finished(samples: usize, duration_ms: u64) {
    info!(event = "eval.finished", samples = samples, duration_ms = duration_ms);
}

/// Emit the accuracy counters at debug level.
pub fn emit_accuracy_summary(counters: &EvalCounters) {
    debug!(
        event = "eval.summary",
        correct = counters.correct,
        total = counters.total,
        unlabelled = counters.unlabelled,
        accuracy = counters.accuracy().unwrap_or(f64::NAN),
        mismatches = counters.mismatches.len(),
    );
    for label in ClassLabel::ALL {
        let total = counters.total_per_class[label.index()];
        if total > 0 {
            debug!(
                event = "eval.class_summary",
                class = %label,
                correct = counters.correct_per_class[label.index()],
                total = total,
            );
        }
    }
    for m in &counters.mismatches {
        debug!(
            event = "eval.mismatch",
            path = %m.path,
            actual = %m.actual,
            predicted = %m.predicted,
        );
    }
}
