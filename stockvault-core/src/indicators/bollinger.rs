//! Bollinger Bands: rolling mean +/- k sample standard deviations.
//!
//! - Middle: mean(close, window)
//! - Upper: middle + k * std(close, window)
//! - Lower: middle - k * std(close, window)
//!
//! Uses sample stddev (divide by N-1), so the window must be at least 2.
//! Lookback: window - 1.

use super::indicator::{Column, Indicator};
use super::window::{rolling_mean, rolling_sample_std};
use crate::domain::PricePoint;

pub const BB_MIDDLE_COLUMN: &str = "bb_middle";
pub const BB_UPPER_COLUMN: &str = "bb_upper";
pub const BB_LOWER_COLUMN: &str = "bb_lower";

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    k: f64,
    name: String,
}

impl Bollinger {
    pub fn new(window: usize, k: f64) -> Self {
        assert!(window >= 2, "Bollinger window must be >= 2");
        Self {
            window,
            k,
            name: format!("bollinger_{window}_{k}"),
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Column> {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let middle = rolling_mean(&closes, self.window);
        let std = rolling_sample_std(&closes, self.window);

        let (upper, lower): (Vec<f64>, Vec<f64>) = middle
            .iter()
            .zip(&std)
            .map(|(&m, &s)| {
                let offset = self.k * s;
                (m + offset, m - offset)
            })
            .unzip();

        vec![
            Column::new(BB_MIDDLE_COLUMN, middle),
            Column::new(BB_UPPER_COLUMN, upper),
            Column::new(BB_LOWER_COLUMN, lower),
        ]
    }
}
