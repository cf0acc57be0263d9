//! klinefill CLI — backfill and inspect kline history.
//!
//! Commands:
//! - `download`: page through the klines endpoint and append to per-symbol CSV files
//! - `status`: report the kline files in an output directory

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use klinefill_core::config::BackfillConfig;
use klinefill_core::data::{
    download_symbols, read_klines, BinanceProvider, CsvSink, StdoutProgress, SymbolSource,
};
use klinefill_core::domain::Interval;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const KLINE_FILE_SUFFIX: &str = "_klines.csv";

#[derive(Parser)]
#[command(
    name = "klinefill",
    about = "klinefill — backfill exchange candlestick history into CSV files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download kline history for each symbol and write one CSV per symbol.
    Download {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbols to download (e.g., BTCUSDT ETHUSDT). Overrides the symbols file.
        symbols: Vec<String>,

        /// CSV file with a `symbol` column. Defaults to ./symbols.csv.
        #[arg(long, conflicts_with = "symbols")]
        symbols_file: Option<PathBuf>,

        /// Candle interval (e.g., 1m, 15m, 1h, 1d). Defaults to 1h.
        #[arg(long)]
        interval: Option<Interval>,

        /// How far back from now to start. Defaults to 180 days.
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Directory for the CSV files. Defaults to the current directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Rows per request, at most 1000.
        #[arg(long)]
        page_size: Option<u32>,

        /// Pause between requests for one symbol, in milliseconds.
        #[arg(long)]
        throttle_ms: Option<u64>,
    },
    /// Report kline files: row count, time span and size.
    Status {
        /// Directory holding the CSV files. Defaults to the current directory.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

/// Command-line overrides applied on top of the config file.
struct DownloadArgs {
    config: Option<PathBuf>,
    symbols: Vec<String>,
    symbols_file: Option<PathBuf>,
    interval: Option<Interval>,
    lookback_days: Option<u32>,
    output_dir: Option<PathBuf>,
    page_size: Option<u32>,
    throttle_ms: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            config,
            symbols,
            symbols_file,
            interval,
            lookback_days,
            output_dir,
            page_size,
            throttle_ms,
        } => run_download(DownloadArgs {
            config,
            symbols,
            symbols_file,
            interval,
            lookback_days,
            output_dir,
            page_size,
            throttle_ms,
        }),
        Commands::Status { output_dir } => run_status(&output_dir),
    }
}

fn build_config(args: DownloadArgs) -> Result<BackfillConfig> {
    let mut config = match &args.config {
        Some(path) => BackfillConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BackfillConfig::default(),
    };

    if !args.symbols.is_empty() {
        config.symbols = SymbolSource::Static { list: args.symbols };
    } else if let Some(path) = args.symbols_file {
        config.symbols = SymbolSource::File { path };
    }
    if let Some(interval) = args.interval {
        config.interval = interval;
    }
    if let Some(days) = args.lookback_days {
        config.lookback_days = days;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(n) = args.page_size {
        config.page_size = n;
    }
    if let Some(ms) = args.throttle_ms {
        config.throttle_ms = ms;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run_download(args: DownloadArgs) -> Result<()> {
    let config = build_config(args)?;

    let symbols = match config.symbols.load() {
        Ok(list) => list,
        Err(e) => {
            eprintln!("Error reading symbols from {}: {e}", config.symbols.describe());
            Vec::new()
        }
    };
    if symbols.is_empty() {
        bail!("no symbols to download (source: {})", config.symbols.describe());
    }

    let range = config.range_ending_at(Utc::now());
    info!(
        symbols = symbols.len(),
        interval = %config.interval,
        %range,
        output_dir = %config.output_dir.display(),
        "starting backfill"
    );

    let provider = BinanceProvider::from_config(&config).context("building HTTP client")?;
    let mut sink = CsvSink::new(&config.output_dir);
    let progress = StdoutProgress;

    let summary = download_symbols(
        &provider,
        &mut sink,
        &symbols,
        config.interval,
        range,
        &config.walker_settings(),
        &progress,
    );

    for report in summary.stopped_early() {
        warn!(symbol = %report.symbol, cursor = %report.cursor, stop = ?report.stop, "symbol stopped before end of range");
    }
    for (sym, err) in &summary.errors {
        eprintln!("Error for {sym}: {err}");
    }

    Ok(())
}

/// One row of the status table.
struct FileStatus {
    name: String,
    span: String,
    rows: String,
    size: u64,
}

fn run_status(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        println!("Output directory does not exist: {}", output_dir.display());
        return Ok(());
    }

    let entries = std::fs::read_dir(output_dir)
        .with_context(|| format!("reading {}", output_dir.display()))?;

    let mut files: Vec<FileStatus> = Vec::new();
    let mut total_size: u64 = 0;

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(stem) = name.strip_suffix(KLINE_FILE_SUFFIX) else {
            continue;
        };
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        total_size += size;

        let (span, rows) = match read_klines(&entry.path()) {
            Ok(klines) => match (klines.first(), klines.last()) {
                (Some(first), Some(last)) => (
                    format!(
                        "{} to {}",
                        format_open_time(first.open_time),
                        format_open_time(last.open_time)
                    ),
                    format!("{} rows", klines.len()),
                ),
                _ => ("(empty)".into(), "0 rows".into()),
            },
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable kline file");
                ("(unreadable)".into(), "-".into())
            }
        };

        files.push(FileStatus {
            name: stem.to_string(),
            span,
            rows,
            size,
        });
    }

    if files.is_empty() {
        println!("No kline files in: {}", output_dir.display());
        return Ok(());
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    println!("Directory: {}", output_dir.display());
    println!("Files: {}", files.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<20} {:<37} {:<12} {:>10}", "Series", "Open Time Range", "Rows", "Size");
    println!("{}", "-".repeat(82));
    for f in &files {
        println!(
            "{:<20} {:<37} {:<12} {:>10}",
            f.name,
            f.span,
            f.rows,
            format_size(f.size)
        );
    }

    Ok(())
}

fn format_open_time(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
