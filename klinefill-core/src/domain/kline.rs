//! Kline — one candlestick row as returned by the exchange.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// CSV header for kline files, in wire order.
pub const KLINE_HEADER: [&str; 12] = [
    "Open time",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Close time",
    "Quote asset volume",
    "Number of trades",
    "Taker buy base asset volume",
    "Taker buy quote asset volume",
    "Ignore",
];

/// One candlestick for a single symbol and interval.
///
/// Price and volume columns are kept as the exchange's decimal strings so a
/// row written to disk is byte-for-byte what the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kline {
    /// Open time, epoch milliseconds.
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    /// Close time, epoch milliseconds.
    pub close_time: i64,
    pub quote_volume: String,
    pub trade_count: u64,
    pub taker_buy_base_volume: String,
    pub taker_buy_quote_volume: String,
    /// Trailing field the exchange documents as unused.
    pub ignore: String,
}

impl Kline {
    /// Columns in header order, ready for a CSV writer.
    pub fn to_record(&self) -> [String; 12] {
        [
            self.open_time.to_string(),
            self.open.clone(),
            self.high.clone(),
            self.low.clone(),
            self.close.clone(),
            self.volume.clone(),
            self.close_time.to_string(),
            self.quote_volume.clone(),
            self.trade_count.to_string(),
            self.taker_buy_base_volume.clone(),
            self.taker_buy_quote_volume.clone(),
            self.ignore.clone(),
        ]
    }

    /// Rebuild a row from CSV columns in header order.
    pub fn from_record<'a, I>(fields: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cols: Vec<&str> = fields.into_iter().collect();
        if cols.len() != KLINE_HEADER.len() {
            return Err(format!(
                "expected {} columns, found {}",
                KLINE_HEADER.len(),
                cols.len()
            ));
        }

        let int = |idx: usize| -> Result<i64, String> {
            cols[idx]
                .parse::<i64>()
                .map_err(|e| format!("{} '{}': {e}", KLINE_HEADER[idx], cols[idx]))
        };

        Ok(Self {
            open_time: int(0)?,
            open: cols[1].to_string(),
            high: cols[2].to_string(),
            low: cols[3].to_string(),
            close: cols[4].to_string(),
            volume: cols[5].to_string(),
            close_time: int(6)?,
            quote_volume: cols[7].to_string(),
            trade_count: cols[8]
                .parse::<u64>()
                .map_err(|e| format!("{} '{}': {e}", KLINE_HEADER[8], cols[8]))?,
            taker_buy_base_volume: cols[9].to_string(),
            taker_buy_quote_volume: cols[10].to_string(),
            ignore: cols[11].to_string(),
        })
    }
}

// The exchange encodes a kline as a positional JSON array:
// [open_time, "open", "high", "low", "close", "volume", close_time,
//  "quote_volume", trade_count, "taker_base", "taker_quote", "ignore"]
impl<'de> Deserialize<'de> for Kline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KlineVisitor;

        impl<'de> Visitor<'de> for KlineVisitor {
            type Value = Kline;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a kline array with 12 elements")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let kline = Kline {
                    open_time: next_field(&mut seq, 0, &self)?,
                    open: next_field(&mut seq, 1, &self)?,
                    high: next_field(&mut seq, 2, &self)?,
                    low: next_field(&mut seq, 3, &self)?,
                    close: next_field(&mut seq, 4, &self)?,
                    volume: next_field(&mut seq, 5, &self)?,
                    close_time: next_field(&mut seq, 6, &self)?,
                    quote_volume: next_field(&mut seq, 7, &self)?,
                    trade_count: next_field(&mut seq, 8, &self)?,
                    taker_buy_base_volume: next_field(&mut seq, 9, &self)?,
                    taker_buy_quote_volume: next_field(&mut seq, 10, &self)?,
                    ignore: next_field(&mut seq, 11, &self)?,
                };

                // Newer API revisions may append columns.
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}

                Ok(kline)
            }
        }

        deserializer.deserialize_seq(KlineVisitor)
    }
}

fn next_field<'de, A, T>(
    seq: &mut A,
    index: usize,
    expected: &dyn de::Expected,
) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(index, expected))
}
