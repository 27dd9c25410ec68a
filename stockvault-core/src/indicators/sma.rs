//! Simple Moving Average over close or volume.
//!
//! Rolling arithmetic mean over a lookback window.
//! Lookback: window - 1 (first valid value at index window-1).

use super::indicator::{Column, Indicator};
use super::window::rolling_mean;
use crate::domain::PricePoint;

/// Which field of a price point the average is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceField {
    Close,
    Volume,
}

impl PriceField {
    fn extract(self, points: &[PricePoint]) -> Vec<f64> {
        match self {
            PriceField::Close => points.iter().map(|p| p.close).collect(),
            PriceField::Volume => points.iter().map(|p| p.volume as f64).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    field: PriceField,
    name: String,
}

impl MovingAverage {
    /// Moving average of close, column `ma_{window}`.
    pub fn close(window: usize) -> Self {
        assert!(window >= 1, "moving average window must be >= 1");
        Self {
            window,
            field: PriceField::Close,
            name: close_ma_column(window),
        }
    }

    /// Moving average of volume, column `volume_ma_{window}`.
    pub fn volume(window: usize) -> Self {
        assert!(window >= 1, "volume moving average window must be >= 1");
        Self {
            window,
            field: PriceField::Volume,
            name: volume_ma_column(window),
        }
    }
}

pub fn close_ma_column(window: usize) -> String {
    format!("ma_{window}")
}

pub fn volume_ma_column(window: usize) -> String {
    format!("volume_ma_{window}")
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Column> {
        let values = self.field.extract(points);
        vec![Column::new(
            self.name.clone(),
            rolling_mean(&values, self.window),
        )]
    }
}
