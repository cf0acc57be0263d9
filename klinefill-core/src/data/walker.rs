//! Window walker: the per-symbol backfill loop.
//!
//! Walks forward from the start of the range one bounded window at a time.
//! The cursor for the next window is the last returned open time plus one
//! interval, so sparse pages and gaps in trading never cause overlap or
//! drift. An empty page ends the symbol.

use super::provider::{DataError, DownloadProgress, KlineSource};
use super::sink::KlineSink;
use crate::domain::SymbolTask;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Loop parameters shared by every symbol of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerSettings {
    /// Rows per request; the window span is `page_size × interval`.
    pub page_size: u32,
    /// Courtesy delay between consecutive requests for a symbol.
    pub throttle: Duration,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            throttle: Duration::from_millis(500),
        }
    }
}

/// Why a symbol's backfill loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Cursor reached the end of the range.
    Completed,
    /// The source returned an empty page (no data, or retries exhausted).
    NoData,
    /// The last row's open time could not be turned into a cursor.
    InvalidCursor,
}

/// Outcome of one symbol's backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub symbol: String,
    /// Pages fetched and handed to the sink.
    pub chunks: usize,
    pub rows: usize,
    pub stop: StopReason,
    /// Cursor position when the loop ended.
    pub cursor: DateTime<Utc>,
}

/// Backfill one symbol over `task.range`.
///
/// Sink failures abort this symbol with `Err`; fetch failures only surface
/// as an empty page and end the loop with [`StopReason::NoData`].
pub fn backfill_symbol(
    source: &dyn KlineSource,
    sink: &mut dyn KlineSink,
    task: &SymbolTask,
    settings: &WalkerSettings,
    progress: &dyn DownloadProgress,
) -> Result<BackfillReport, DataError> {
    let step = task.interval.duration();
    let max_span = task.interval.span(settings.page_size);

    let mut cursor = task.range.start;
    let mut chunks = 0usize;
    let mut rows_written = 0usize;

    let stop = loop {
        if cursor >= task.range.end {
            break StopReason::Completed;
        }

        let window = task.range.chunk_from(cursor, max_span);
        progress.on_chunk_start(&task.symbol, chunks + 1, &window);

        let rows = source.fetch_page(&task.symbol, task.interval, &window);
        progress.on_chunk_complete(&task.symbol, chunks + 1, rows.len());

        let Some(last) = rows.last() else {
            info!(
                source = source.name(),
                symbol = %task.symbol,
                %window,
                "empty page, stopping symbol"
            );
            break StopReason::NoData;
        };
        let last_open = last.open_time;

        sink.append(&task.symbol, task.interval, &rows, chunks == 0)?;
        chunks += 1;
        rows_written += rows.len();

        // Assumes the page is sorted ascending; not re-checked here.
        match DateTime::from_timestamp_millis(last_open).and_then(|t| t.checked_add_signed(step)) {
            Some(next) => cursor = next,
            None => {
                warn!(symbol = %task.symbol, last_open, "open time out of range, stopping symbol");
                break StopReason::InvalidCursor;
            }
        }

        if cursor < task.range.end && !settings.throttle.is_zero() {
            std::thread::sleep(settings.throttle);
        }
    };

    Ok(BackfillReport {
        symbol: task.symbol.clone(),
        chunks,
        rows: rows_written,
        stop,
        cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::SilentProgress;
    use crate::domain::{Interval, Kline, Window};
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Mutex;

    fn kline(open_time: i64) -> Kline {
        Kline {
            open_time,
            open: "1".into(),
            high: "2".into(),
            low: "0.5".into(),
            close: "1.5".into(),
            volume: "10".into(),
            close_time: open_time.saturating_add(59_999),
            quote_volume: "15".into(),
            trade_count: 3,
            taker_buy_base_volume: "4".into(),
            taker_buy_quote_volume: "6".into(),
            ignore: "0".into(),
        }
    }

    /// Returns scripted pages in order, then empty pages. Records windows.
    struct ScriptedSource {
        pages: Mutex<Vec<Vec<Kline>>>,
        windows: Mutex<Vec<Window>>,
    }

    impl ScriptedSource {
        fn new(mut pages: Vec<Vec<Kline>>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                windows: Mutex::new(Vec::new()),
            }
        }
    }

    impl KlineSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch_page(&self, _symbol: &str, _interval: Interval, window: &Window) -> Vec<Kline> {
            self.windows.lock().unwrap().push(*window);
            self.pages.lock().unwrap().pop().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct MemorySink {
        pages: Vec<(Vec<Kline>, bool)>,
    }

    impl KlineSink for MemorySink {
        fn append(
            &mut self,
            _symbol: &str,
            _interval: Interval,
            rows: &[Kline],
            first_page: bool,
        ) -> Result<(), DataError> {
            self.pages.push((rows.to_vec(), first_page));
            Ok(())
        }
    }

    struct FailingSink;

    impl KlineSink for FailingSink {
        fn append(
            &mut self,
            _symbol: &str,
            _interval: Interval,
            _rows: &[Kline],
            _first_page: bool,
        ) -> Result<(), DataError> {
            Err(DataError::Io(std::io::Error::other("disk full")))
        }
    }

    fn minute_task(minutes: i64) -> SymbolTask {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        SymbolTask::new(
            "BTCUSDT",
            Interval::M1,
            Window::new(start, start + TimeDelta::minutes(minutes)),
        )
    }

    fn settings(page_size: u32) -> WalkerSettings {
        WalkerSettings {
            page_size,
            throttle: Duration::ZERO,
        }
    }

    #[test]
    fn cursor_advances_from_last_open_time() {
        let task = minute_task(10);
        let base = task.range.start_ms();
        // Sparse first page: only minutes 0 and 2 traded.
        let source = ScriptedSource::new(vec![
            vec![kline(base), kline(base + 120_000)],
            vec![kline(base + 180_000)],
        ]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(5), &SilentProgress).unwrap();

        let windows = source.windows.lock().unwrap();
        assert_eq!(windows[0].start_ms(), base);
        assert_eq!(windows[0].end_ms(), base + 5 * 60_000);
        assert_eq!(windows[1].start_ms(), base + 180_000);
        assert_eq!(windows[2].start_ms(), base + 240_000);
        assert_eq!(report.stop, StopReason::NoData);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.rows, 3);
    }

    #[test]
    fn only_first_page_is_flagged() {
        let task = minute_task(6);
        let base = task.range.start_ms();
        let source = ScriptedSource::new(vec![
            vec![kline(base), kline(base + 60_000)],
            vec![kline(base + 120_000), kline(base + 180_000)],
            vec![kline(base + 240_000), kline(base + 300_000)],
        ]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(2), &SilentProgress).unwrap();

        let flags: Vec<bool> = sink.pages.iter().map(|(_, first)| *first).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert_eq!(report.stop, StopReason::Completed);
        assert_eq!(report.cursor, task.range.end);
    }

    #[test]
    fn empty_first_page_writes_nothing() {
        let task = minute_task(60);
        let source = ScriptedSource::new(vec![]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(1000), &SilentProgress).unwrap();

        assert!(sink.pages.is_empty());
        assert_eq!(report.chunks, 0);
        assert_eq!(report.stop, StopReason::NoData);
        assert_eq!(report.cursor, task.range.start);
    }

    #[test]
    fn empty_range_makes_no_requests() {
        let task = minute_task(0);
        let source = ScriptedSource::new(vec![vec![kline(0)]]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(10), &SilentProgress).unwrap();

        assert!(source.windows.lock().unwrap().is_empty());
        assert_eq!(report.stop, StopReason::Completed);
    }

    #[test]
    fn sink_failure_propagates() {
        let task = minute_task(10);
        let source = ScriptedSource::new(vec![vec![kline(task.range.start_ms())]]);

        let err = backfill_symbol(&source, &mut FailingSink, &task, &settings(5), &SilentProgress)
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn unrepresentable_open_time_stops_symbol() {
        let task = minute_task(10);
        let source = ScriptedSource::new(vec![vec![kline(i64::MAX)]]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(5), &SilentProgress).unwrap();

        assert_eq!(report.stop, StopReason::InvalidCursor);
        assert_eq!(sink.pages.len(), 1);
        assert_eq!(sink.pages[0].0[0].close_time, i64::MAX);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.cursor, task.range.start);
        assert_eq!(source.windows.lock().unwrap().len(), 1);
    }

    #[test]
    fn oversized_page_covers_range_in_one_window() {
        let task = minute_task(10);
        let base = task.range.start_ms();
        let source = ScriptedSource::new(vec![vec![kline(base), kline(base + 540_000)]]);
        let mut sink = MemorySink::default();

        let report =
            backfill_symbol(&source, &mut sink, &task, &settings(u32::MAX), &SilentProgress)
                .unwrap();

        let windows = source.windows.lock().unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], task.range);
        assert_eq!(report.stop, StopReason::Completed);
    }
}
