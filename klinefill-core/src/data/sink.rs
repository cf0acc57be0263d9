//! Kline sinks: where fetched pages are persisted.
//!
//! The CSV sink keeps one file per symbol and interval. The first page of a
//! backfill truncates the file and writes the header; every later page opens
//! the file in append mode and writes rows only.

use super::provider::DataError;
use crate::domain::{Interval, Kline, KLINE_HEADER};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for pages of klines.
pub trait KlineSink {
    /// Persist `rows` for `symbol`/`interval`. `first_page` is true only for
    /// the first successful page of a backfill.
    fn append(
        &mut self,
        symbol: &str,
        interval: Interval,
        rows: &[Kline],
        first_page: bool,
    ) -> Result<(), DataError>;
}

/// Output file name for a symbol/interval pair.
pub fn kline_file_name(symbol: &str, interval: Interval) -> String {
    format!("{symbol}_{interval}_klines.csv")
}

/// Writes klines to `<output_dir>/<SYMBOL>_<interval>_klines.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.output_dir.join(kline_file_name(symbol, interval))
    }
}

impl KlineSink for CsvSink {
    fn append(
        &mut self,
        symbol: &str,
        interval: Interval,
        rows: &[Kline],
        first_page: bool,
    ) -> Result<(), DataError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(symbol, interval);

        let file = if first_page {
            File::create(&path)?
        } else {
            OpenOptions::new().create(true).append(true).open(&path)?
        };

        let mut wtr = csv::Writer::from_writer(file);
        if first_page {
            wtr.write_record(KLINE_HEADER)?;
        }
        for row in rows {
            wtr.write_record(row.to_record())?;
        }
        wtr.flush()?;

        debug!(path = %path.display(), rows = rows.len(), first_page, "appended klines");
        Ok(())
    }
}

/// Read a kline CSV written by [`CsvSink`] back into rows, in file order.
pub fn read_klines(path: &Path) -> Result<Vec<Kline>, DataError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = Kline::from_record(record.iter())
            .map_err(|e| DataError::InvalidRow(format!("{} line {}: {e}", path.display(), i + 2)))?;
        rows.push(row);
    }
    Ok(rows)
}
