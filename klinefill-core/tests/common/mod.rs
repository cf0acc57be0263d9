//! Shared stubs for the integration tests.
#![allow(dead_code)]

use klinefill_core::data::{DataError, KlineSink, KlineSource};
use klinefill_core::domain::{Interval, Kline, Window};
use std::sync::Mutex;

/// Deterministic kline whose prices encode its open time.
pub fn kline(open_time: i64, step_ms: i64) -> Kline {
    let base = (open_time / step_ms.max(1)).rem_euclid(10_000);
    Kline {
        open_time,
        open: format!("{base}.10000000"),
        high: format!("{base}.90000000"),
        low: format!("{base}.00000000"),
        close: format!("{base}.50000000"),
        volume: "1234.56780000".into(),
        close_time: open_time + step_ms - 1,
        quote_volume: "98765.43210000".into(),
        trade_count: (base as u64) + 1,
        taker_buy_base_volume: "600.00000000".into(),
        taker_buy_quote_volume: "48000.00000000".into(),
        ignore: "0".into(),
    }
}

/// Fake exchange: one candle per interval boundary, capped at `limit` rows
/// per request, optionally with no data at or after `data_end_ms`.
pub struct SyntheticExchange {
    pub limit: usize,
    pub data_end_ms: Option<i64>,
    /// Drop candles whose index is a multiple of this (sparse trading).
    pub drop_every: Option<i64>,
    pub windows: Mutex<Vec<Window>>,
}

impl SyntheticExchange {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            data_end_ms: None,
            drop_every: None,
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Window> {
        self.windows.lock().unwrap().clone()
    }
}

impl KlineSource for SyntheticExchange {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_page(&self, _symbol: &str, interval: Interval, window: &Window) -> Vec<Kline> {
        self.windows.lock().unwrap().push(*window);

        let step = interval.duration().num_milliseconds();
        let start = window.start_ms();
        let mut open = start.div_euclid(step) * step;
        if open < start {
            open += step;
        }

        let mut rows = Vec::new();
        while open < window.end_ms() && rows.len() < self.limit {
            if self.data_end_ms.is_some_and(|end| open >= end) {
                break;
            }
            let dropped = self
                .drop_every
                .is_some_and(|n| (open / step).rem_euclid(n) == 0);
            if !dropped {
                rows.push(kline(open, step));
            }
            open += step;
        }
        rows
    }
}

/// Sink that keeps every page in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub pages: Vec<RecordedPage>,
}

pub struct RecordedPage {
    pub symbol: String,
    pub rows: Vec<Kline>,
    pub first_page: bool,
}

impl RecordingSink {
    pub fn pages_for(&self, symbol: &str) -> Vec<&RecordedPage> {
        self.pages.iter().filter(|p| p.symbol == symbol).collect()
    }
}

impl KlineSink for RecordingSink {
    fn append(
        &mut self,
        symbol: &str,
        _interval: Interval,
        rows: &[Kline],
        first_page: bool,
    ) -> Result<(), DataError> {
        self.pages.push(RecordedPage {
            symbol: symbol.to_string(),
            rows: rows.to_vec(),
            first_page,
        });
        Ok(())
    }
}
