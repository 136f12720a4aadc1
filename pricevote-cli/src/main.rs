//! PriceVote CLI — compile, train, sweep and inspect commands.
//!
//! Commands:
//! - `compile` — join per-ticker CSV files into one tabular store
//! - `train` — label, featurize and train the committee for one ticker
//! - `sweep` — train every ticker of the store in turn
//! - `inspect` — report store shape, date range and gaps

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pricevote_core::data::compile_matrix;
use pricevote_core::labels::generate_labels;
use pricevote_core::models::SplitStrategy;
use pricevote_runner::{
    export_sweep_csv, export_sweep_json, export_training_json, generate_report,
    generate_sweep_report, load_matrix, log_split_policy, run_sweep, save_matrix, train_ticker,
    write_json, write_label_frame, CsvDirFeed, PipelineConfig, TickerListFile, TrainingReport,
};

#[derive(Parser)]
#[command(
    name = "pricevote",
    about = "PriceVote CLI — forward-return labels and a voting classifier committee"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join per-ticker CSV files into a single tabular store.
    Compile {
        /// Ticker list file (one per line, # comments).
        #[arg(long)]
        tickers: PathBuf,

        /// Directory holding {TICKER}.csv files.
        #[arg(long)]
        feed_dir: PathBuf,

        /// Output store CSV.
        #[arg(long)]
        out: PathBuf,
    },
    /// Train and score the committee for one target ticker.
    Train {
        /// Tabular store CSV.
        #[arg(long)]
        store: PathBuf,

        /// Target ticker.
        #[arg(long)]
        ticker: String,

        /// Pipeline config TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the split policy (keeps the configured test fraction).
        #[arg(long, value_enum)]
        split: Option<SplitArg>,

        /// Override the master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Write the report as JSON.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write horizon returns and labels as CSV.
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// Train every ticker of the store as target.
    Sweep {
        /// Tabular store CSV.
        #[arg(long)]
        store: PathBuf,

        /// Pipeline config TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only the first N tickers.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Write the sweep report as JSON.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write one CSV row per ticker.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Report store shape, date range and per-ticker gaps.
    Inspect {
        /// Tabular store CSV.
        #[arg(long)]
        store: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitArg {
    Random,
    Chronological,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile {
            tickers,
            feed_dir,
            out,
        } => run_compile(&tickers, &feed_dir, &out),
        Commands::Train {
            store,
            ticker,
            config,
            split,
            seed,
            json,
            labels,
        } => run_train(&store, &ticker, config, split, seed, json, labels),
        Commands::Sweep {
            store,
            config,
            limit,
            seed,
            json,
            csv,
        } => run_sweep_cmd(&store, config, limit, seed, json, csv),
        Commands::Inspect { store } => run_inspect(&store),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    path: Option<PathBuf>,
    split: Option<SplitArg>,
    seed: Option<u64>,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(p) => PipelineConfig::from_file(&p)?,
        None => PipelineConfig::default(),
    };
    if let Some(split) = split {
        let test_fraction = config.split.test_fraction();
        config.split = match split {
            SplitArg::Random => SplitStrategy::Random { test_fraction },
            SplitArg::Chronological => SplitStrategy::Chronological { test_fraction },
        };
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_compile(tickers: &Path, feed_dir: &Path, out: &Path) -> Result<()> {
    let source = TickerListFile::new(tickers);
    let feed = CsvDirFeed::new(feed_dir);
    let matrix = compile_matrix(&source, &feed).context("failed to compile price matrix")?;
    save_matrix(&matrix, out)?;

    println!(
        "Compiled {} tickers x {} dates into {}",
        matrix.n_cols(),
        matrix.n_rows(),
        out.display()
    );
    let empty = matrix.gap_report().empty_tickers().len();
    if empty > 0 {
        println!("{empty} ticker(s) had no data and are all-absent columns");
    }
    Ok(())
}

fn run_train(
    store: &Path,
    ticker: &str,
    config_path: Option<PathBuf>,
    split: Option<SplitArg>,
    seed: Option<u64>,
    json: Option<PathBuf>,
    labels: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path, split, seed)?;
    let matrix = load_matrix(store)
        .with_context(|| format!("failed to load store {}", store.display()))?;
    log_split_policy(&config);

    if let Some(path) = labels {
        let frame = generate_labels(&matrix, ticker, &config.label)?;
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_label_frame(&frame, file)?;
        info!(path = %path.display(), "labels written");
    }

    let report = train_ticker(&matrix, ticker, &config)?;
    print_summary(&report);

    if let Some(path) = json {
        write_json(&path, &export_training_json(&report)?)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    store: &Path,
    config_path: Option<PathBuf>,
    limit: Option<usize>,
    seed: Option<u64>,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path, None, seed)?;
    let matrix = load_matrix(store)
        .with_context(|| format!("failed to load store {}", store.display()))?;
    log_split_policy(&config);

    let sweep = run_sweep(&matrix, &config, limit)?;
    print!("{}", generate_sweep_report(&sweep));

    if let Some(path) = json {
        write_json(&path, &export_sweep_json(&sweep)?)?;
        println!("Sweep report saved to: {}", path.display());
    }
    if let Some(path) = csv {
        std::fs::write(&path, export_sweep_csv(&sweep)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Sweep table saved to: {}", path.display());
    }
    Ok(())
}

fn run_inspect(store: &Path) -> Result<()> {
    let matrix = load_matrix(store)
        .with_context(|| format!("failed to load store {}", store.display()))?;
    let gaps = matrix.gap_report();

    println!("Store: {}", store.display());
    println!("Dataset hash: {}", matrix.fingerprint().short());
    println!("Tickers: {}", matrix.n_cols());
    println!("Dates: {}", matrix.n_rows());
    if let Some((first, last)) = matrix.date_range() {
        println!("Range: {first} to {last}");
    }
    println!("Absent cells: {}", gaps.total_absent());
    println!();
    println!("{:<12} {:>8} {:>8}", "Ticker", "Absent", "Present");
    println!("{}", "-".repeat(30));
    for g in &gaps.per_ticker {
        println!(
            "{:<12} {:>8} {:>8}",
            g.ticker,
            g.absent,
            gaps.rows - g.absent
        );
    }
    Ok(())
}

fn print_summary(report: &TrainingReport) {
    println!();
    print!("{}", generate_report(report));
    println!();
    println!(
        "{}: accuracy {:.4} on {} test rows (data spread {})",
        report.ticker, report.accuracy, report.test_rows, report.label_distribution
    );
}
