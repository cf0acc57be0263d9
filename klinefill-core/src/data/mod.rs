//! Data acquisition: row source, window walker, sink, symbol sources, driver.

pub mod binance;
pub mod download;
pub mod provider;
pub mod retry;
pub mod sink;
pub mod symbols;
pub mod walker;

pub use binance::{BinanceProvider, BINANCE_KLINES_URL, MAX_PAGE_SIZE};
pub use download::{download_symbols, DownloadSummary};
pub use provider::{DataError, DownloadProgress, KlineSource, SilentProgress, StdoutProgress};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sink::{kline_file_name, read_klines, CsvSink, KlineSink};
pub use symbols::{load_symbols_file, parse_symbols, SymbolSource, DEFAULT_SYMBOLS_FILE};
pub use walker::{backfill_symbol, BackfillReport, StopReason, WalkerSettings};
