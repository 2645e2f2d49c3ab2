//! seqclass core library
//!
//! Evaluates a trained MRI sequence classifier over DICOM series and
//! reports one predicted class per series.
//!
//! Pipeline: [`config`] resolves the run, [`dataset`] and [`loader`] produce
//! samples in order, [`model`] runs the network, [`eval`] accumulates
//! predictions and counters, [`report`] renders the results.

pub mod config;
pub mod dataset;
pub mod determinism;
pub mod error;
pub mod eval;
pub mod fakes;
pub mod label;
pub mod loader;
pub mod model;
pub mod obs;
pub mod report;
pub mod telemetry;

pub use config::{
    parse_series_list, Architecture, DimensionMode, InputSource, RunConfig, DEFAULT_MODELS_DIR,
    DEFAULT_SLICES, DEFAULT_WORKERS,
};
pub use dataset::{infer_label, Sample, SampleSource, SeriesDataset, SeriesEntry};
pub use determinism::{ExecutionPolicy, OptimizationLevel};
pub use error::{ConfigError, DatasetError, EvalError, ModelError, Result};
pub use eval::{argmax, EvalCounters, EvalOutcome, Evaluator, Mismatch};
pub use label::{ClassLabel, ClassSet};
pub use loader::SampleLoader;
pub use model::{shape_input, Classifier, InputTensor, NetSpec, OnnxClassifier};
pub use obs::{
    emit_accuracy_summary, emit_eval_finished, emit_eval_started, emit_sample_evaluated, run_span,
};
pub use report::{
    format_elapsed, write_summary_json, AccuracySummary, ClassAccuracy, Prediction, PredictionMap,
};
pub use telemetry::{init_tracing, level_for};

/// seqclass version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
