//! Quote source trait, fetch outcome and adapter error types.
//!
//! The QuoteSource trait abstracts over upstream providers (Yahoo Finance,
//! fixtures in tests). Providers never hand errors to the engine: every
//! failure is folded into [`FetchOutcome::Failed`] at the adapter boundary.

use crate::domain::PricePoint;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

/// Adapter-internal error types.
///
/// These never cross into the engine; [`FetchOutcome::from_result`] turns
/// them into a `Failed` outcome carrying the rendered message.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid upstream row for {symbol} on {date}: {reason}")]
    InvalidRow {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// What a fetch produced.
///
/// `NoData` and `Failed` are both "nothing to store" for the engine; they are
/// kept apart so persistent upstream failures can be logged differently from
/// a plain absence of newer quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Rows(Vec<PricePoint>),
    NoData,
    Failed { reason: String },
}

impl FetchOutcome {
    /// Fold an adapter result into an outcome. An empty row set becomes `NoData`.
    pub fn from_result(result: Result<Vec<PricePoint>, DataError>) -> Self {
        match result {
            Ok(rows) if rows.is_empty() => FetchOutcome::NoData,
            Ok(rows) => FetchOutcome::Rows(rows),
            Err(DataError::SymbolNotFound { .. }) => FetchOutcome::NoData,
            Err(e) => FetchOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Trait for upstream quote providers.
///
/// Implementations handle the specifics of one source. The store and the
/// engine sit above this trait; providers know nothing about persistence.
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily points for `symbol` with `start <= trade_date <= end`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> FetchOutcome;

    /// Best-effort display name; the raw symbol on any failure.
    fn resolve_display_name(&self, symbol: &str) -> String;
}

/// Drop malformed rows and keep only the requested symbol/range.
///
/// A row with any non-finite price is dropped whole rather than patched, so
/// every stored row is a quote the provider actually reported.
pub fn sanitize_rows(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    rows: Vec<PricePoint>,
) -> Vec<PricePoint> {
    let received = rows.len();
    let kept: Vec<PricePoint> = rows
        .into_iter()
        .filter(|p| {
            if p.symbol != symbol || p.trade_date < start || p.trade_date > end {
                debug!(requested = symbol, got = %p.symbol, date = %p.trade_date, "dropping row outside request");
                return false;
            }
            if p.is_void() {
                debug!(symbol, date = %p.trade_date, "dropping row with non-finite price");
                return false;
            }
            true
        })
        .collect();

    if kept.len() < received {
        debug!(symbol, received, kept = kept.len(), "sanitized upstream rows");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            symbol: "AAPL".into(),
            trade_date: date(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn outcome_from_result() {
        assert_eq!(FetchOutcome::from_result(Ok(vec![])), FetchOutcome::NoData);
        assert_eq!(
            FetchOutcome::from_result(Ok(vec![point(3, 1.0)])),
            FetchOutcome::Rows(vec![point(3, 1.0)])
        );
        assert_eq!(
            FetchOutcome::from_result(Err(DataError::SymbolNotFound {
                symbol: "XX".into()
            })),
            FetchOutcome::NoData
        );
        let failed = FetchOutcome::from_result(Err(DataError::NetworkUnreachable("timeout".into())));
        assert!(matches!(failed, FetchOutcome::Failed { reason } if reason.contains("timeout")));
    }

    #[test]
    fn sanitize_drops_void_rows_and_rows_outside_request() {
        let mut no_close = point(4, 1.0);
        no_close.close = f64::NAN;
        let mut no_open = point(5, 7.0);
        no_open.open = f64::NAN;
        let mut foreign = point(5, 3.0);
        foreign.symbol = "MSFT".into();

        let rows = sanitize_rows(
            "AAPL",
            date(3),
            date(5),
            vec![point(2, 1.0), point(3, 2.0), no_close, no_open, foreign, point(6, 9.0)],
        );
        assert_eq!(rows, vec![point(3, 2.0)]);
    }

    #[test]
    fn sanitize_keeps_clean_rows_untouched() {
        let rows = vec![point(3, 1.0), point(4, 2.0), point(5, 3.0)];
        assert_eq!(sanitize_rows("AAPL", date(3), date(5), rows.clone()), rows);
    }
}
