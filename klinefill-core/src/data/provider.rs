//! Row source trait, progress reporting, and structured error types.
//!
//! The KlineSource trait abstracts over where pages of klines come from (the
//! exchange REST API in production, scripted stubs in tests) so the window
//! walker never touches HTTP directly.

use super::download::DownloadSummary;
use super::walker::{BackfillReport, StopReason};
use crate::domain::{Interval, Kline, SymbolTask, Window};
use std::io::Write;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output and log lines.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("http transport error: {0}")]
    Http(String),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("gave up on {symbol} after {attempts} attempts: {last}")]
    RetriesExhausted {
        symbol: String,
        attempts: u32,
        last: String,
    },

    #[error("invalid kline row: {0}")]
    InvalidRow(String),

    #[error("symbol list error: {0}")]
    SymbolList(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A source of kline pages (the exchange, or a stub in tests).
///
/// `fetch_page` never fails: an empty vector means the upstream has no data
/// for the window or every retry failed. That is the only failure signal the
/// walker sees.
pub trait KlineSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the rows whose open times fall in `window`, ascending.
    fn fetch_page(&self, symbol: &str, interval: Interval, window: &Window) -> Vec<Kline>;
}

/// Progress callback for multi-symbol backfills.
pub trait DownloadProgress: Send {
    /// Called before the first chunk of a symbol.
    fn on_symbol_start(&self, task: &SymbolTask, index: usize, total: usize);

    /// Called before each chunk request. `chunk` is 1-based.
    fn on_chunk_start(&self, symbol: &str, chunk: usize, window: &Window);

    /// Called after each chunk request with the number of rows received.
    fn on_chunk_complete(&self, symbol: &str, chunk: usize, rows: usize);

    /// Called when a symbol's backfill ends, successfully or not.
    fn on_symbol_complete(&self, symbol: &str, result: &Result<BackfillReport, DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, summary: &DownloadSummary);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_symbol_start(&self, task: &SymbolTask, index: usize, total: usize) {
        println!(
            "[{}/{}] Downloading {} {} data from {}",
            index + 1,
            total,
            task.symbol,
            task.interval,
            task.range
        );
    }

    fn on_chunk_start(&self, _symbol: &str, chunk: usize, window: &Window) {
        print!("  Fetching chunk {chunk}: {window} ...");
        let _ = std::io::stdout().flush();
    }

    fn on_chunk_complete(&self, _symbol: &str, _chunk: usize, rows: usize) {
        if rows == 0 {
            println!(" no data or error, stopping.");
        } else {
            println!(" got {rows} rows.");
        }
    }

    fn on_symbol_complete(&self, symbol: &str, result: &Result<BackfillReport, DataError>) {
        match result {
            Ok(report) => {
                let note = match report.stop {
                    StopReason::Completed => "",
                    StopReason::NoData => " (stopped early: no data)",
                    StopReason::InvalidCursor => " (stopped early: bad open time)",
                };
                println!(
                    "Finished {symbol}: {} chunks, {} rows downloaded{note}.\n",
                    report.chunks, report.rows
                );
            }
            Err(e) => println!("FAIL: {symbol}: {e}\n"),
        }
    }

    fn on_batch_complete(&self, summary: &DownloadSummary) {
        println!(
            "Download complete: {}/{} symbols succeeded, {} failed, {} rows total",
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.total_rows()
        );
    }
}

/// Progress reporter that prints nothing.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_symbol_start(&self, _task: &SymbolTask, _index: usize, _total: usize) {}
    fn on_chunk_start(&self, _symbol: &str, _chunk: usize, _window: &Window) {}
    fn on_chunk_complete(&self, _symbol: &str, _chunk: usize, _rows: usize) {}
    fn on_symbol_complete(&self, _symbol: &str, _result: &Result<BackfillReport, DataError>) {}
    fn on_batch_complete(&self, _summary: &DownloadSummary) {}
}
