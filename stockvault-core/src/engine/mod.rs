//! Backfill engine: keeps the store complete for the ranges callers ask for.
//!
//! The engine sits between a [`SeriesStore`](crate::data::SeriesStore) and a
//! [`QuoteSource`](crate::data::QuoteSource):
//!
//! 1. `ensure_range` fills an empty range or a missing tail, then reloads
//! 2. `refresh_if_stale` tops up one symbol when its latest date is too old
//! 3. `refresh_all` runs the staleness check over every tracked symbol

pub mod backfill;

pub use backfill::{BackfillEngine, SweepSummary, DEFAULT_LOOKBACK_DAYS};

use crate::data::StoreError;
use crate::series::SeriesError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("price store unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("stored series is inconsistent: {0}")]
    CorruptSeries(#[from] SeriesError),
}

/// Anything the engine accepts as a trade date: a `NaiveDate` or an ISO
/// `YYYY-MM-DD` string.
pub trait IntoTradeDate {
    fn into_trade_date(self) -> Result<NaiveDate, EngineError>;
}

impl IntoTradeDate for NaiveDate {
    fn into_trade_date(self) -> Result<NaiveDate, EngineError> {
        Ok(self)
    }
}

impl IntoTradeDate for &str {
    fn into_trade_date(self) -> Result<NaiveDate, EngineError> {
        NaiveDate::parse_from_str(self.trim(), "%Y-%m-%d").map_err(|e| {
            EngineError::InvalidRequest(format!("cannot parse date '{self}' as YYYY-MM-DD: {e}"))
        })
    }
}

impl IntoTradeDate for String {
    fn into_trade_date(self) -> Result<NaiveDate, EngineError> {
        self.as_str().into_trade_date()
    }
}
