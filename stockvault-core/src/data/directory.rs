//! Read-only symbol directory loaded from a CSV side file.
//!
//! Columns: `stock_id,stock_name,stock_type`. Lookups for unknown keys return
//! the key itself, so callers always get something printable.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("cannot read symbol directory {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row {line} in symbol directory {}: {source}", path.display())]
    Row {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "stock_id")]
    pub code: String,
    #[serde(rename = "stock_name")]
    pub name: String,
    #[serde(rename = "stock_type")]
    pub market_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl SymbolDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.code = e.code.trim().to_string();
                e.name = e.name.trim().to_string();
                e.market_type = e.market_type.trim().to_string();
                (e.code.clone(), e)
            })
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DirectoryError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = Vec::new();
        for (i, record) in reader.deserialize::<DirectoryEntry>().enumerate() {
            let entry = record.map_err(|source| DirectoryError::Row {
                path: path.to_path_buf(),
                // header is line 1
                line: i as u64 + 2,
                source,
            })?;
            entries.push(entry);
        }

        let directory = Self::from_entries(entries);
        debug!(path = %path.display(), entries = directory.len(), "loaded symbol directory");
        Ok(directory)
    }

    /// Load `path`, or fall back to an empty directory when it does not exist.
    pub fn load_or_empty(path: &Path) -> Result<Self, DirectoryError> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "symbol directory not found, names and market types fall back to symbols"
            );
            return Ok(Self::empty());
        }
        Self::load(path)
    }

    /// Entry for `symbol`, trying the full symbol first and then the code
    /// without its exchange suffix (`2330.TW` -> `2330`).
    pub fn lookup(&self, symbol: &str) -> Option<&DirectoryEntry> {
        self.entries
            .get(symbol)
            .or_else(|| self.entries.get(base_code(symbol)))
    }

    pub fn display_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.lookup(symbol).map_or(symbol, |e| e.name.as_str())
    }

    /// Exchange-qualify a bare numeric code (`2330` -> `2330.TW`).
    ///
    /// Symbols that already carry a suffix, or codes the directory does not
    /// know, are returned unchanged.
    pub fn qualify(&self, code: &str) -> String {
        let code = code.trim();
        let is_bare_code = !code.contains('.') && code.chars().all(|c| c.is_ascii_alphanumeric());
        match self.entries.get(code) {
            Some(entry) if is_bare_code && !entry.market_type.is_empty() => {
                format!("{code}.{}", entry.market_type)
            }
            _ => code.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The part of a symbol before its exchange suffix.
pub fn base_code(symbol: &str) -> &str {
    symbol.split_once('.').map_or(symbol, |(code, _)| code)
}

/// The exchange suffix of a symbol, if it has one (`2330.TW` -> `TW`).
pub fn exchange_suffix(symbol: &str) -> Option<&str> {
    symbol
        .rsplit_once('.')
        .map(|(_, suffix)| suffix)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(code: &str, name: &str, market_type: &str) -> DirectoryEntry {
        DirectoryEntry {
            code: code.into(),
            name: name.into(),
            market_type: market_type.into(),
        }
    }

    fn sample() -> SymbolDirectory {
        SymbolDirectory::from_entries([
            entry("2330", "台積電", "TW"),
            entry("6488", "環球晶", "TWO"),
        ])
    }

    #[test]
    fn lookup_by_code_and_qualified_symbol() {
        let dir = sample();
        assert_eq!(dir.display_name("2330"), "台積電");
        assert_eq!(dir.display_name("2330.TW"), "台積電");
        assert_eq!(dir.lookup("6488.TWO").map(|e| e.market_type.as_str()), Some("TWO"));
        assert!(dir.lookup("6488").is_some());
    }

    #[test]
    fn unknown_keys_echo_back() {
        let dir = sample();
        assert_eq!(dir.display_name("AAPL"), "AAPL");
        assert!(dir.lookup("AAPL").is_none());
    }

    #[test]
    fn qualify_appends_market_suffix() {
        let dir = sample();
        assert_eq!(dir.qualify("2330"), "2330.TW");
        assert_eq!(dir.qualify(" 6488 "), "6488.TWO");
        assert_eq!(dir.qualify("2330.TW"), "2330.TW");
        assert_eq!(dir.qualify("9999"), "9999");
    }

    #[test]
    fn suffix_helpers() {
        assert_eq!(base_code("2330.TW"), "2330");
        assert_eq!(base_code("AAPL"), "AAPL");
        assert_eq!(exchange_suffix("6488.TWO"), Some("TWO"));
        assert_eq!(exchange_suffix("AAPL"), None);
        assert_eq!(exchange_suffix("BAD."), None);
    }

    #[test]
    fn load_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stock_id,stock_name,stock_type").unwrap();
        writeln!(file, "2330, 台積電 ,TW").unwrap();
        writeln!(file, "6488,環球晶,TWO").unwrap();

        let dir = SymbolDirectory::load(file.path()).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.display_name("2330.TW"), "台積電");
    }

    #[test]
    fn malformed_row_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stock_id,stock_name,stock_type").unwrap();
        writeln!(file, "2330,台積電,TW").unwrap();
        writeln!(file, "6488,環球晶").unwrap();

        match SymbolDirectory::load(file.path()) {
            Err(DirectoryError::Row { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SymbolDirectory::load_or_empty(&dir.path().join("stock_list.csv")).unwrap();
        assert!(loaded.is_empty());
    }
}
