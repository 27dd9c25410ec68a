//! Series store trait and its error type.
//!
//! The store persists two logical tables: descriptive symbol records keyed by
//! symbol, and daily price facts keyed by `(symbol, trade_date)`. The engine
//! only talks to this trait, so tests and alternative backends can swap in.

use crate::domain::{PricePoint, SymbolInfo};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open price store at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot create store directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("malformed price row for '{symbol}': {reason}")]
    Corrupt { symbol: String, reason: String },
}

pub trait SeriesStore {
    /// Points for `symbol` with `start <= trade_date <= end`, ascending by date.
    fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError>;

    /// Insert or overwrite points keyed by `(symbol, trade_date)`.
    ///
    /// Last write wins on every OHLCV field. An empty slice is a no-op.
    /// Returns the number of rows written.
    fn upsert(&self, rows: &[PricePoint]) -> Result<usize, StoreError>;

    /// Most recent stored trade date for `symbol`, across all time.
    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError>;

    /// Whether any point for `symbol` falls inside `[start, end]`.
    fn has_rows_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, StoreError>;

    fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, StoreError>;

    /// Create the descriptive record for `symbol` if it does not exist yet.
    ///
    /// Existing records are left untouched. Returns true when a record was
    /// created.
    fn ensure_symbol_metadata(
        &self,
        symbol: &str,
        display_name: &str,
        market_type: &str,
    ) -> Result<bool, StoreError>;

    /// Every symbol with a descriptive record, ordered by symbol.
    fn tracked_symbols(&self) -> Result<Vec<SymbolInfo>, StoreError>;
}
