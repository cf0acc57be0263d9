//! klinefill core — historical kline backfill from an exchange REST API.
//!
//! This crate contains:
//! - Domain types (klines, intervals, time windows, symbol tasks)
//! - A blocking Binance klines provider with bounded exponential backoff
//! - The window walker that paginates a symbol's history page by page
//! - A CSV sink writing one file per symbol and interval
//! - Symbol sources (static list or CSV table) and the multi-symbol driver
//! - TOML configuration

pub mod config;
pub mod data;
pub mod domain;

pub use config::{BackfillConfig, ConfigError, RetrySettings};
