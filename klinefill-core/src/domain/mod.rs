//! Domain types: klines, intervals, windows.

pub mod interval;
pub mod kline;
pub mod window;

pub use interval::Interval;
pub use kline::{Kline, KLINE_HEADER};
pub use window::{BackfillRange, SymbolTask, Window};
