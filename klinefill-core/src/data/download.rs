//! Download orchestrator — runs the window walker over a list of symbols.

use super::provider::{DataError, DownloadProgress, KlineSource};
use super::sink::KlineSink;
use super::walker::{backfill_symbol, BackfillReport, StopReason, WalkerSettings};
use crate::domain::{BackfillRange, Interval, SymbolTask};
use tracing::{info, warn};

/// Backfill every symbol in order, one at a time.
///
/// A failing symbol is recorded and the batch moves on to the next one.
pub fn download_symbols(
    source: &dyn KlineSource,
    sink: &mut dyn KlineSink,
    symbols: &[String],
    interval: Interval,
    range: BackfillRange,
    settings: &WalkerSettings,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut reports = Vec::with_capacity(total);
    let mut errors: Vec<(String, DataError)> = Vec::new();
    info!(source = source.name(), symbols = total, %interval, %range, "starting batch");

    for (i, symbol) in symbols.iter().enumerate() {
        let task = SymbolTask::new(symbol.as_str(), interval, range);
        progress.on_symbol_start(&task, i, total);

        let result = backfill_symbol(source, sink, &task, settings, progress);
        progress.on_symbol_complete(symbol, &result);

        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(source = source.name(), symbol = %symbol, error = %e, "symbol failed");
                errors.push((symbol.clone(), e));
            }
        }
    }

    let summary = DownloadSummary {
        total,
        succeeded: reports.len(),
        failed: errors.len(),
        reports,
        errors,
    };
    progress.on_batch_complete(&summary);
    summary
}

/// Summary of a batch download operation.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub reports: Vec<BackfillReport>,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn total_rows(&self) -> usize {
        self.reports.iter().map(|r| r.rows).sum()
    }

    /// Symbols whose loop ended on an empty page before reaching the range end.
    pub fn stopped_early(&self) -> impl Iterator<Item = &BackfillReport> {
        self.reports
            .iter()
            .filter(|r| r.stop != StopReason::Completed)
    }
}
