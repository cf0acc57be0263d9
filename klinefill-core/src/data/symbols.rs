//! Symbol sources — where the list of symbols to backfill comes from.
//!
//! Either a static list (config file or command line) or a CSV table with a
//! `symbol` column. Table values are trimmed and blanks are skipped; a
//! malformed record is logged and skipped so one bad line does not lose the
//! rest of the list.

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default symbols table next to the working directory.
pub const DEFAULT_SYMBOLS_FILE: &str = "symbols.csv";

/// Where to read the symbol list from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SymbolSource {
    /// A fixed list.
    Static { list: Vec<String> },
    /// A CSV table with a `symbol` header column.
    File { path: PathBuf },
}

impl Default for SymbolSource {
    fn default() -> Self {
        SymbolSource::File {
            path: PathBuf::from(DEFAULT_SYMBOLS_FILE),
        }
    }
}

impl SymbolSource {
    /// Resolve the symbol list.
    ///
    /// Static lists are trimmed and blanks dropped. File sources fail only if
    /// the file cannot be opened or has no `symbol` column.
    pub fn load(&self) -> Result<Vec<String>, DataError> {
        match self {
            SymbolSource::Static { list } => Ok(list
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            SymbolSource::File { path } => load_symbols_file(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SymbolSource::Static { list } => format!("{} configured symbol(s)", list.len()),
            SymbolSource::File { path } => path.display().to_string(),
        }
    }
}

/// Read symbols from a CSV file with a `symbol` column.
pub fn load_symbols_file(path: &Path) -> Result<Vec<String>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| {
        DataError::SymbolList(format!("error reading symbols from {}: {e}", path.display()))
    })?;
    parse_symbols(file)
        .map_err(|e| DataError::SymbolList(format!("{}: {e}", path.display())))
}

/// Parse a symbols table from any reader.
pub fn parse_symbols<R: Read>(reader: R) -> Result<Vec<String>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| format!("read header: {e}"))?;
    let column = headers
        .iter()
        .position(|h| h == "symbol")
        .ok_or_else(|| "no 'symbol' column in header".to_string())?;

    let mut symbols = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(line = i + 2, error = %e, "skipping malformed symbol record");
                continue;
            }
        };
        if let Some(symbol) = record.get(column).map(str::trim).filter(|s| !s.is_empty()) {
            symbols.push(symbol.to_string());
        }
    }

    Ok(symbols)
}
