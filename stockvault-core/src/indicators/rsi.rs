//! Relative Strength Index (RSI).
//!
//! Simple rolling mean of gains and losses over `period` price changes
//! (not Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first change is at index 1).
//! avg_loss == 0 → RSI = 100, including a flat window.

use super::indicator::{Column, Indicator};
use super::window::rolling_mean;
use crate::domain::PricePoint;

pub const RSI_COLUMN: &str = "rsi";

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Column> {
        let n = points.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];

        for i in 1..n {
            let delta = points[i].close - points[i - 1].close;
            if delta.is_nan() {
                continue;
            }
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        let values = avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| compute_rsi(g, l))
            .collect();

        vec![Column::new(RSI_COLUMN, values)]
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        // RS is infinite; saturate instead of dividing by zero
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
