//! PricePoint: one trading day of OHLCV for one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV for a single exchange-qualified symbol (e.g. `2330.TW`).
///
/// `(symbol, trade_date)` is the identity key. Storing a point with an
/// existing key replaces its OHLCV fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .any(|v| !v.is_finite())
    }
}

/// Descriptive record for a tracked symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub display_name: String,
    pub industry: String,
    /// Exchange board, e.g. `TW` (listed) or `TWO` (OTC).
    pub market_type: String,
    pub listing_date: Option<NaiveDate>,
}

impl SymbolInfo {
    pub const UNKNOWN_INDUSTRY: &'static str = "unknown";

    pub fn new(
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        market_type: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
            industry: Self::UNKNOWN_INDUSTRY.to_string(),
            market_type: market_type.into(),
            listing_date: None,
        }
    }
}
