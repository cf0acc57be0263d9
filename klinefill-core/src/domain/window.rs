//! Time windows and per-symbol backfill tasks.

use super::Interval;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Half-open UTC time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// The sub-window starting at `cursor`, at most `max_span` wide and
    /// never past `self.end`.
    pub fn chunk_from(&self, cursor: DateTime<Utc>, max_span: TimeDelta) -> Window {
        let end = cursor
            .checked_add_signed(max_span)
            .map_or(self.end, |e| e.min(self.end));
        Window::new(cursor, end)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Overall range for a backfill run.
pub type BackfillRange = Window;

impl Window {
    /// `[now - lookback, now)`.
    pub fn trailing(now: DateTime<Utc>, lookback: TimeDelta) -> BackfillRange {
        Window::new(now - lookback, now)
    }
}

/// One unit of work: backfill `symbol` at `interval` over `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTask {
    pub symbol: String,
    pub interval: Interval,
    pub range: BackfillRange,
}

impl SymbolTask {
    pub fn new(symbol: impl Into<String>, interval: Interval, range: BackfillRange) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn chunk_is_clamped_to_range_end() {
        let range = Window::new(t(0), t(10));
        let chunk = range.chunk_from(t(8), TimeDelta::hours(5));
        assert_eq!(chunk, Window::new(t(8), t(10)));
    }

    #[test]
    fn chunk_uses_full_span_when_room() {
        let range = Window::new(t(0), t(10));
        let chunk = range.chunk_from(t(1), TimeDelta::hours(3));
        assert_eq!(chunk, Window::new(t(1), t(4)));
    }

    #[test]
    fn unbounded_span_clamps_to_range_end() {
        let range = Window::new(t(0), t(10));
        assert_eq!(range.chunk_from(t(2), TimeDelta::MAX), Window::new(t(2), t(10)));
    }

    #[test]
    fn trailing_range_ends_now() {
        let now = t(12);
        let range = Window::trailing(now, TimeDelta::hours(12));
        assert_eq!(range.start, t(0));
        assert_eq!(range.end, now);
    }
}
