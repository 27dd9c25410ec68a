//! Technical indicators over a daily price series.
//!
//! Each indicator implements [`Indicator`] and only adds columns to an
//! [`IndicatorSeries`]. [`compute_all`] runs the default stages in a fixed
//! order; running them one by one gives identical columns.

pub mod bollinger;
pub mod indicator;
pub mod macd;
pub mod pipeline;
pub mod rsi;
pub mod sma;
pub mod window;

pub use bollinger::{Bollinger, BB_LOWER_COLUMN, BB_MIDDLE_COLUMN, BB_UPPER_COLUMN};
pub use indicator::{Column, Indicator, IndicatorRow, IndicatorSeries};
pub use macd::{Macd, MACD_COLUMN, SIGNAL_COLUMN};
pub use pipeline::{compute, compute_all, IndicatorError, IndicatorOptions};
pub use rsi::{Rsi, RSI_COLUMN};
pub use sma::{close_ma_column, volume_ma_column, MovingAverage};

/// Create synthetic price points from closes for testing.
///
/// open = previous close (or close for the first point),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<crate::domain::PricePoint> {
    use crate::domain::PricePoint;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                symbol: "TEST".to_string(),
                trade_date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
