//! StockVault Core: daily price store, incremental backfill and indicators.
//!
//! This crate contains:
//! - Domain types (price points, symbol records) and ordered series
//! - The series store trait and its SQLite implementation
//! - The quote source trait and its Yahoo Finance implementation
//! - The backfill engine that keeps requested ranges complete
//! - The indicator pipeline (MA, RSI, MACD, Bollinger, volume MA)
//! - Trend interpretation of the latest indicator row

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod series;

pub use config::AppConfig;
pub use engine::{BackfillEngine, EngineError, IntoTradeDate, SweepSummary};
pub use indicators::{compute, compute_all, IndicatorOptions, IndicatorSeries};
pub use series::Series;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: value types handed across threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PricePoint>();
        require_sync::<domain::PricePoint>();
        require_send::<domain::SymbolInfo>();
        require_sync::<domain::SymbolInfo>();
        require_send::<series::Series>();
        require_sync::<series::Series>();

        // Indicator types
        require_send::<indicators::IndicatorSeries>();
        require_sync::<indicators::IndicatorSeries>();
        require_send::<indicators::IndicatorRow>();
        require_sync::<indicators::IndicatorRow>();
        require_send::<indicators::IndicatorOptions>();
        require_sync::<indicators::IndicatorOptions>();
        require_send::<analysis::TrendReport>();
        require_sync::<analysis::TrendReport>();

        // Upstream
        require_send::<data::FetchOutcome>();
        require_sync::<data::FetchOutcome>();
        require_send::<data::YahooQuoteSource>();
        require_sync::<data::YahooQuoteSource>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::SymbolDirectory>();
        require_sync::<data::SymbolDirectory>();

        // Config
        require_send::<config::AppConfig>();
        require_sync::<config::AppConfig>();
    }

    /// Architecture contract: indicators see prices only, never the store.
    ///
    /// `Indicator::compute` takes a slice of points and returns columns; if
    /// this stops compiling, an indicator has grown a dependency on I/O.
    #[test]
    fn indicator_trait_is_pure_over_points() {
        fn _check_trait_object_builds(
            indicator: &dyn indicators::Indicator,
            points: &[domain::PricePoint],
        ) -> Vec<indicators::Column> {
            indicator.compute(points)
        }
    }
}
