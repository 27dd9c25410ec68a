//! Moving Average Convergence/Divergence (MACD).
//!
//! EMA_fast, EMA_slow: EMA of close with alpha = 2/(span+1), seeded with the
//! first close.
//! MACD = EMA_fast - EMA_slow
//! Signal = EMA(MACD, signal span), same seeding.
//! Lookback: slow + signal - 2. Both columns stay absent through the whole
//! warm-up even though the recurrence runs from row 0.

use super::indicator::{Column, Indicator};
use super::window::ema_seeded_first;
use crate::domain::PricePoint;

pub const MACD_COLUMN: &str = "macd";
pub const SIGNAL_COLUMN: &str = "signal";

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(fast < slow, "MACD fast span must be shorter than slow span");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Column> {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let ema_fast = ema_seeded_first(&closes, self.fast);
        let ema_slow = ema_seeded_first(&closes, self.slow);

        let mut macd: Vec<f64> = ema_fast
            .iter()
            .zip(&ema_slow)
            .map(|(f, s)| f - s)
            .collect();
        let mut signal = ema_seeded_first(&macd, self.signal);

        let warmup = self.lookback().min(points.len());
        for v in macd.iter_mut().take(warmup) {
            *v = f64::NAN;
        }
        for v in signal.iter_mut().take(warmup) {
            *v = f64::NAN;
        }

        vec![
            Column::new(MACD_COLUMN, macd),
            Column::new(SIGNAL_COLUMN, signal),
        ]
    }
}
