//! Observability tests for evaluation lifecycle tracing.

use seqclass_core::{
    emit_accuracy_summary, emit_eval_finished, emit_eval_started, emit_sample_evaluated,
    run_span, ClassLabel, EvalCounters,
};
use tracing::Instrument;
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_eval_started_logs_architecture() {
    emit_eval_started("resnet18", 12, 8);
    assert!(logs_contain("eval.started"));
    assert!(logs_contain("resnet18"));
}

#[traced_test]
#[test]
fn test_emit_sample_evaluated_logs_path_and_prediction() {
    emit_sample_evaluated(3, "/data/T1/s3", Some(ClassLabel::T1), ClassLabel::T2);
    assert!(logs_contain("/data/T1/s3"));
    assert!(logs_contain("predicted=T2"));
}

#[traced_test]
#[test]
fn test_emit_eval_finished_logs_duration() {
    emit_eval_finished(12, 4500);
    assert!(logs_contain("duration_ms=4500"));
}

#[traced_test]
#[test]
fn test_accuracy_summary_lists_mismatches() {
    let mut counters = EvalCounters::new();
    counters.record("/d/a", Some(ClassLabel::Flair), ClassLabel::T2);
    emit_accuracy_summary(&counters);
    assert!(logs_contain("eval.summary"));
    assert!(logs_contain("eval.mismatch"));
    assert!(logs_contain("/d/a"));
}

#[traced_test]
#[test]
fn test_run_span_scopes_events() {
    run_span("net.onnx").in_scope(|| emit_eval_finished(0, 0));
    assert!(logs_contain("seqclass.eval"));
}

#[traced_test]
#[tokio::test]
async fn test_run_span_follows_instrumented_future_across_await() {
    async {
        emit_eval_started("alexnet", 2, 1);
        tokio::task::yield_now().await;
        emit_eval_finished(2, 7);
    }
    .instrument(run_span("across.onnx"))
    .await;

    assert!(logs_contain("across.onnx"));
    assert!(logs_contain("duration_ms=7"));
    logs_assert(|lines: &[&str]| {
        let finished: Vec<_> = lines.iter().filter(|l| l.contains("duration_ms=7")).collect();
        match finished.as_slice() {
            [line] if line.contains("seqclass.eval") && line.contains("across.onnx") => Ok(()),
            other => Err(format!("eval.finished outside the run span: {:?}", other)),
        }
    });
}
