//! Binance spot klines provider.
//!
//! Fetches one page of klines per request from `/api/v3/klines`. Every failed
//! attempt (transport error, non-2xx status, undecodable body) is retried with
//! exponential backoff; once attempts run out the page is reported empty.

use super::provider::{DataError, KlineSource};
use super::retry::{retry_with_backoff, RetryPolicy};
use crate::config::BackfillConfig;
use crate::domain::{Interval, Kline, Window};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Public spot klines endpoint.
pub const BINANCE_KLINES_URL: &str = "https://api.binance.com/api/v3/klines";

/// Binance caps `limit` at 1000 rows per request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Query string for a klines request.
#[derive(Debug, Serialize)]
struct KlineQuery<'a> {
    symbol: &'a str,
    interval: &'static str,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "endTime")]
    end_time: i64,
    limit: u32,
}

/// Binance REST klines provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl BinanceProvider {
    pub fn new(
        endpoint: impl Into<String>,
        page_size: u32,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("klinefill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            page_size,
            retry,
        })
    }

    pub fn from_config(config: &BackfillConfig) -> Result<Self, DataError> {
        Self::new(
            config.endpoint.clone(),
            config.page_size,
            config.request_timeout(),
            config.retry.policy(),
        )
    }

    /// One HTTP round trip, no retry.
    fn request_page(
        &self,
        symbol: &str,
        interval: Interval,
        window: &Window,
    ) -> Result<Vec<Kline>, DataError> {
        let query = KlineQuery {
            symbol,
            interval: interval.as_str(),
            start_time: window.start_ms(),
            end_time: window.end_ms(),
            limit: self.page_size,
        };

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .map_err(|e| DataError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DataError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        resp.json::<Vec<Kline>>()
            .map_err(|e| DataError::Decode(format!("klines for {symbol}: {e}")))
    }

    /// Fetch one page, retrying every failure per the retry policy.
    pub fn fetch_with_retry(
        &self,
        symbol: &str,
        interval: Interval,
        window: &Window,
    ) -> Result<Vec<Kline>, DataError> {
        retry_with_backoff(&self.retry, |attempt| {
            debug!(symbol, %interval, %window, attempt, "requesting klines page");
            self.request_page(symbol, interval, window)
        })
        .map_err(|last| DataError::RetriesExhausted {
            symbol: symbol.to_string(),
            attempts: self.retry.max_attempts.max(1),
            last: last.to_string(),
        })
    }
}

impl KlineSource for BinanceProvider {
    fn name(&self) -> &str {
        "binance_spot"
    }

    fn fetch_page(&self, symbol: &str, interval: Interval, window: &Window) -> Vec<Kline> {
        match self.fetch_with_retry(symbol, interval, window) {
            Ok(rows) => {
                debug!(symbol, rows = rows.len(), "fetched klines page");
                rows
            }
            Err(e) => {
                error!(symbol, %interval, %window, error = %e, "failed to fetch klines");
                Vec::new()
            }
        }
    }
}
