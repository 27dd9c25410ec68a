//! The fixed indicator pipeline: MA → RSI → MACD → Bollinger → volume MA.

use super::bollinger::Bollinger;
use super::indicator::{Indicator, IndicatorSeries};
use super::macd::Macd;
use super::rsi::Rsi;
use super::sma::MovingAverage;
use crate::domain::PricePoint;
use crate::series::SeriesError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("invalid indicator options: {0}")]
    InvalidOptions(String),
}

/// Parameters for every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorOptions {
    pub ma_windows: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub volume_ma_windows: Vec<usize>,
}

impl Default for IndicatorOptions {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 20],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_k: 2.0,
            volume_ma_windows: vec![5],
        }
    }
}

impl IndicatorOptions {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let invalid = |msg: String| Err(IndicatorError::InvalidOptions(msg));

        if let Some(w) = self.ma_windows.iter().find(|&&w| w == 0) {
            return invalid(format!("moving average window must be >= 1, got {w}"));
        }
        if let Some(w) = self.volume_ma_windows.iter().find(|&&w| w == 0) {
            return invalid(format!("volume moving average window must be >= 1, got {w}"));
        }
        if self.rsi_period == 0 {
            return invalid("RSI period must be >= 1".into());
        }
        if self.macd_fast == 0 || self.macd_signal == 0 {
            return invalid("MACD spans must be >= 1".into());
        }
        if self.macd_fast >= self.macd_slow {
            return invalid(format!(
                "MACD fast span ({}) must be shorter than slow span ({})",
                self.macd_fast, self.macd_slow
            ));
        }
        if self.bollinger_window < 2 {
            return invalid(format!(
                "Bollinger window must be >= 2 for sample stddev, got {}",
                self.bollinger_window
            ));
        }
        if !self.bollinger_k.is_finite() || self.bollinger_k < 0.0 {
            return invalid(format!(
                "Bollinger multiplier must be finite and non-negative, got {}",
                self.bollinger_k
            ));
        }
        Ok(())
    }

    /// The configured stages, in pipeline order.
    ///
    /// Call [`validate`](Self::validate) first; constructors assert on bad
    /// parameters.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut stages: Vec<Box<dyn Indicator>> = Vec::new();
        for &w in &self.ma_windows {
            stages.push(Box::new(MovingAverage::close(w)));
        }
        stages.push(Box::new(Rsi::new(self.rsi_period)));
        stages.push(Box::new(Macd::new(
            self.macd_fast,
            self.macd_slow,
            self.macd_signal,
        )));
        stages.push(Box::new(Bollinger::new(
            self.bollinger_window,
            self.bollinger_k,
        )));
        for &w in &self.volume_ma_windows {
            stages.push(Box::new(MovingAverage::volume(w)));
        }
        stages
    }

    /// Largest lookback across all stages: rows before this index may have
    /// absent values.
    pub fn max_lookback(&self) -> usize {
        self.indicators()
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }
}

/// Run every configured stage over `points`.
///
/// Rows are preserved one-for-one; short input simply yields absent values.
pub fn compute(
    points: &[PricePoint],
    options: &IndicatorOptions,
) -> Result<IndicatorSeries, IndicatorError> {
    options.validate()?;
    let mut series = IndicatorSeries::new(points.to_vec())?;
    for indicator in options.indicators() {
        series.apply(indicator.as_ref());
    }
    Ok(series)
}

/// [`compute`] with the default parameters (MA 5/20, RSI 14, MACD 12/26/9,
/// Bollinger 20/2, volume MA 5).
pub fn compute_all(points: &[PricePoint]) -> Result<IndicatorSeries, IndicatorError> {
    compute(points, &IndicatorOptions::default())
}
