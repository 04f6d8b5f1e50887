//! Scorecard CLI — model discovery, metrics computation, cache and blob
//! management over a local object store.
//!
//! stdout carries command payloads (JSON); all logging goes to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use sc_common::{Config, Error, Result};
use sc_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sc_core::{
    BenchmarkScores, HistogramCache, LocalStore, MetricsEngine, ModelCatalog, ModelData,
    ModelKind, ObjectStore, ObservationSource, PlainScores, StoreCache,
};
use sc_math::ResampleStrategy;

/// Scorecard — diagnostic metrics for binary classifiers
#[derive(Parser)]
#[command(name = "scorecard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the config file
    #[arg(long, global = true, env = "SCORECARD_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory override (wins over the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error|off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human|jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Command {
    /// List discovered models with their last-modified times
    List {
        /// Only models whose path contains this substring
        #[arg(long)]
        search: Option<String>,
    },
    /// Compute metrics: canonical result first, then bootstrap draws
    Metrics {
        /// Model path relative to the data directory
        model: String,
        /// Number of resampled variants to append
        #[arg(long, default_value_t = 0)]
        bootstrap: usize,
        /// Resampling strategy (rows|poisson)
        #[arg(long, default_value_t = ResampleStrategy::Rows)]
        resample: ResampleStrategy,
        /// RNG seed for reproducible bands
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the model's histogram, computing and caching it if needed
    Histogram {
        model: String,
        /// Drop the cached histogram first
        #[arg(long)]
        refresh: bool,
    },
    /// Read or replace the free-text notes blob
    Notes {
        model: String,
        #[command(subcommand)]
        action: BlobAction,
    },
    /// Read or replace the free-text metadata blob
    Metadata {
        model: String,
        #[command(subcommand)]
        action: BlobAction,
    },
    /// Remove a model directory from storage
    Delete { model: String },
}

#[derive(Subcommand)]
enum BlobAction {
    /// Print the blob if present
    Get,
    /// Overwrite the blob
    Set { text: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format,
    ));
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error ({}): {}", e.category(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::resolve(cli.global.config.as_deref())?;
    if let Some(data_dir) = cli.global.data_dir {
        config.data_dir = data_dir;
    }
    let store = LocalStore::new(&config.data_dir);

    match cli.command {
        Command::List { search } => {
            let catalog = ModelCatalog::new(&store);
            let models = match search {
                Some(needle) => catalog.search(&needle)?,
                None => catalog.list()?,
            };
            println!("{}", serde_json::to_string_pretty(&models)?);
        }
        Command::Metrics {
            model,
            bootstrap,
            resample,
            seed,
        } => {
            let entry = find_model(&store, &model)?;
            let cache = StoreCache::new(&store);
            match entry.kind {
                ModelKind::Plain => print_metrics(
                    &store,
                    &cache,
                    PlainScores::new(entry.path),
                    bootstrap,
                    resample,
                    seed,
                )?,
                ModelKind::Benchmarked => print_metrics(
                    &store,
                    &cache,
                    BenchmarkScores::new(entry.path),
                    bootstrap,
                    resample,
                    seed,
                )?,
            }
        }
        Command::Histogram { model, refresh } => {
            let entry = find_model(&store, &model)?;
            let cache = StoreCache::new(&store);
            match entry.kind {
                ModelKind::Plain => {
                    print_histogram(&store, &cache, PlainScores::new(entry.path), refresh)?
                }
                ModelKind::Benchmarked => {
                    print_histogram(&store, &cache, BenchmarkScores::new(entry.path), refresh)?
                }
            }
        }
        Command::Notes { model, action } => {
            let data = ModelData::new(&store, model);
            match action {
                BlobAction::Get => {
                    if let Some(text) = data.notes()? {
                        println!("{}", text);
                    }
                }
                BlobAction::Set { text } => data.set_notes(&text)?,
            }
        }
        Command::Metadata { model, action } => {
            let data = ModelData::new(&store, model);
            match action {
                BlobAction::Get => {
                    if let Some(text) = data.metadata()? {
                        println!("{}", text);
                    }
                }
                BlobAction::Set { text } => data.set_metadata(&text)?,
            }
        }
        Command::Delete { model } => {
            ModelData::new(&store, model).delete()?;
        }
    }
    Ok(())
}

fn find_model(store: &dyn ObjectStore, model: &str) -> Result<sc_core::ModelEntry> {
    ModelCatalog::new(store)
        .find(model)?
        .ok_or_else(|| Error::MissingScores(model.to_string()))
}

fn print_metrics<S: ObservationSource>(
    store: &dyn ObjectStore,
    cache: &dyn HistogramCache,
    source: S,
    bootstrap: usize,
    resample: ResampleStrategy,
    seed: u64,
) -> Result<()> {
    let engine = MetricsEngine::new(store, cache, source);
    let results = engine.compute_metrics(bootstrap, resample, seed)?;
    println!("{}", serde_json::to_string(&results)?);
    Ok(())
}

fn print_histogram<S: ObservationSource>(
    store: &dyn ObjectStore,
    cache: &dyn HistogramCache,
    source: S,
    refresh: bool,
) -> Result<()> {
    let engine = MetricsEngine::new(store, cache, source);
    if refresh {
        engine.delete_cache()?;
    }
    let hist = engine.build_histogram()?;
    println!("{}", serde_json::to_string(&hist)?);
    Ok(())
}
