//! seqclass - MRI sequence classifier evaluation
//!
//! The `seqclass` command runs a trained network over DICOM series and prints
//! one JSON object mapping each series path to its predicted sequence type:
//!
//! ```text
//! {"/data/FLAIR/s1": {"prediction": "FLAIR"}, ...}
//! ```
//!
//! Logs go to standard error (`-d/--debug` for per-sample detail); standard
//! output carries only the prediction JSON.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use dicom_series::SeriesOptions;
use seqclass_core::{
    emit_accuracy_summary, emit_eval_finished, emit_eval_started, format_elapsed, level_for, run_span,
    write_summary_json, AccuracySummary, Architecture, DimensionMode, Evaluator, ExecutionPolicy,
    InputSource, NetSpec, OnnxClassifier, RunConfig, SampleLoader, SeriesDataset,
    DEFAULT_MODELS_DIR, DEFAULT_SLICES, DEFAULT_WORKERS,
};
use tracing::{debug, Instrument};

#[derive(Parser, Debug)]
#[command(name = "seqclass")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate a trained MRI sequence classifier on DICOM series", long_about = None)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["test_list", "series_paths"]),
))]
struct Cli {
    /// Txt file listing directory paths containing DICOM files to be tested (one path per line)
    #[arg(short = 't', value_name = "FILE")]
    test_list: Option<PathBuf>,

    /// Paths to directories of DICOM series containing DICOM files to be tested
    #[arg(long = "series-paths", num_args = 1.., value_name = "PATH")]
    series_paths: Option<Vec<String>>,

    /// Name of the trained model file (resolved inside the models directory)
    #[arg(short = 'm', value_name = "NAME")]
    model_file: String,

    /// Number of central slices considered by the trained model (also `-sl`)
    #[arg(long = "slices", value_name = "N", default_value_t = DEFAULT_SLICES)]
    slices: usize,

    /// Use if the trained model used tridimensional convolution (also `-3d`)
    #[arg(long = "tridim")]
    tridim: bool,

    /// If specified, "Other" class is not considered
    #[arg(long = "no-other")]
    no_other: bool,

    /// Network architecture to be used
    #[arg(long = "net", value_name = "NAME", default_value = "resnet18")]
    net: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory model files are resolved against
    #[arg(long, env = "SEQCLASS_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Number of series loaded concurrently
    #[arg(long, env = "SEQCLASS_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    log_json: bool,

    /// Also write aggregate accuracy figures to this file
    #[arg(long, value_name = "FILE")]
    summary_out: Option<PathBuf>,
}

/// Rewrite the single-dash multi-letter flags `-sl` and `-3d` into their long
/// forms so clap can parse them.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-sl") => OsString::from("--slices"),
            Some("-3d") => OsString::from("--tridim"),
            _ => arg,
        })
        .collect()
}

/// Turn parsed arguments into a validated run configuration.
fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let architecture: Architecture = cli.net.parse()?;

    let source = match (&cli.test_list, &cli.series_paths) {
        (Some(list), _) => InputSource::ListFile(list.clone()),
        (None, Some(paths)) => InputSource::SeriesPaths(paths.clone()),
        (None, None) => anyhow::bail!("one of -t or --series-paths is required"),
    };
    let series_paths = source.resolve()?;

    let config = RunConfig::new(
        series_paths,
        architecture,
        cli.slices,
        DimensionMode::from_tridim(cli.tridim),
        !cli.no_other,
        &cli.models_dir,
        &cli.model_file,
        cli.debug,
        cli.workers,
    )?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    seqclass_core::init_tracing(cli.log_json, level_for(cli.debug));

    let config = resolve_config(&cli)?;
    let span = run_span(&config.model_path.display().to_string());
    cmd_evaluate(&config, cli.summary_out.as_deref())
        .instrument(span)
        .await
}

/// Evaluate every series and print the prediction JSON.
async fn cmd_evaluate(config: &RunConfig, summary_out: Option<&Path>) -> Result<()> {
    // Pin the runtime to reproducible execution before anything is loaded.
    let policy = ExecutionPolicy::deterministic();

    let options = SeriesOptions {
        slices: config.slices,
        ..SeriesOptions::default()
    };
    let dataset = SeriesDataset::new(config.series_paths.clone(), options, config.include_other);
    let loader = SampleLoader::new(Arc::new(dataset), config.workers);
    let n_series = loader.len();

    let spec = NetSpec::from_config(config);
    let start = Instant::now();

    let classifier = OnnxClassifier::load(&config.model_path, spec, &policy)
        .with_context(|| format!("Failed to load model {:?}", config.model_path))?;

    emit_eval_started(config.architecture.as_str(), n_series, loader.workers());

    let mut evaluator = Evaluator::new(classifier, config.class_set(), config.mode);
    let outcome = evaluator
        .run(loader.stream(), n_series)
        .await
        .context("Evaluation failed")?;

    println!(
        "{}",
        outcome
            .predictions
            .to_json_line()
            .context("Failed to serialize predictions")?
    );

    let elapsed = start.elapsed();
    debug!("Testing elapsed time: {}", format_elapsed(elapsed));
    emit_eval_finished(outcome.predictions.len(), elapsed.as_millis() as u64);
    emit_accuracy_summary(&outcome.counters);

    if let Some(path) = summary_out {
        let summary = AccuracySummary::from_counters(
            &outcome.counters,
            config.class_set(),
            config.architecture,
            &config.model_path,
        );
        write_summary_json(path, &summary)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        let argv = std::iter::once("seqclass")
            .chain(args.iter().copied())
            .map(OsString::from);
        Cli::try_parse_from(normalize_args(argv))
    }

    #[test]
    fn test_package_metadata_inherited_from_workspace() {
        assert!(env!("CARGO_PKG_REPOSITORY").starts_with("https://"));
        assert!(!env!("CARGO_PKG_AUTHORS").is_empty());
    }

    #[test]
    fn test_normalize_legacy_flags() {
        let out = normalize_args(
            ["seqclass", "-sl", "12", "-3d", "-m", "net.onnx"]
                .into_iter()
                .map(OsString::from),
        );
        let out: Vec<_> = out.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(out, vec!["seqclass", "--slices", "12", "--tridim", "-m", "net.onnx"]);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-m", "net.onnx", "--series-paths", "/a"]).unwrap();
        assert_eq!(cli.slices, 10);
        assert_eq!(cli.net, "resnet18");
        assert!(!cli.tridim);
        assert!(!cli.no_other);
        assert!(!cli.debug);
        assert_eq!(cli.series_paths, Some(vec!["/a".to_string()]));
    }

    #[test]
    fn test_legacy_spelling_parses() {
        let cli = parse(&["-m", "n", "-t", "list.txt", "-sl", "20", "-3d", "--no-other", "-d"])
            .unwrap();
        assert_eq!(cli.slices, 20);
        assert!(cli.tridim);
        assert!(cli.no_other);
        assert!(cli.debug);
        assert_eq!(cli.test_list, Some(PathBuf::from("list.txt")));
    }

    #[test]
    fn test_input_source_is_required() {
        let err = parse(&["-m", "net.onnx"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_input_sources_are_mutually_exclusive() {
        let err = parse(&["-m", "n", "-t", "l.txt", "--series-paths", "/a"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_model_file_is_required() {
        assert!(parse(&["--series-paths", "/a"]).is_err());
    }

    #[test]
    fn test_series_paths_accepts_many() {
        let cli = parse(&["-m", "n", "--series-paths", "/a", "/b", "/c"]).unwrap();
        assert_eq!(cli.series_paths.unwrap().len(), 3);
    }

    #[test]
    fn test_resolve_rejects_unknown_architecture() {
        let cli = parse(&["-m", "n", "--series-paths", "/a", "--net", "densenet"]).unwrap();
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("densenet"));
    }

    #[test]
    fn test_resolve_reads_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("test.txt");
        std::fs::write(&list, "/data/T1/s1\n/data/T2/s2\n").unwrap();

        let cli = parse(&[
            "-m",
            "resnet.onnx",
            "-t",
            list.to_str().unwrap(),
            "--models-dir",
            "weights",
            "--no-other",
            "-3d",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.series_paths, vec!["/data/T1/s1", "/data/T2/s2"]);
        assert_eq!(config.model_path, PathBuf::from("weights/resnet.onnx"));
        assert_eq!(config.mode, DimensionMode::Volumetric);
        assert!(!config.include_other);
    }
}
