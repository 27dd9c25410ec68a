//! Trend interpretation of the latest indicator row.
//!
//! Reads moving averages, RSI, MACD and volume off the last row of an
//! [`IndicatorSeries`] and classifies each, then combines them into a
//! buy/sell/hold suggestion. Pure; rendering belongs to the caller.

use crate::indicators::{
    close_ma_column, volume_ma_column, IndicatorOptions, IndicatorSeries, BB_LOWER_COLUMN,
    BB_UPPER_COLUMN, MACD_COLUMN, RSI_COLUMN, SIGNAL_COLUMN,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Short vs long moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendState {
    /// Short MA above long MA (golden cross side).
    Bullish,
    /// Short MA below long MA (death cross side).
    Bearish,
    Neutral,
    /// Either average still warming up.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdBias {
    /// MACD above its signal line.
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    /// Volume above its moving average.
    Expanding,
    Contracting,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendState::Bullish => "bullish",
            TrendState::Bearish => "bearish",
            TrendState::Neutral => "neutral",
            TrendState::Unknown => "unknown",
        })
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Oversold => "oversold",
            RsiZone::Normal => "normal",
        })
    }
}

impl fmt::Display for MacdBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MacdBias::Bullish => "bullish",
            MacdBias::Bearish => "bearish",
            MacdBias::Neutral => "neutral",
            MacdBias::Unknown => "unknown",
        })
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumeTrend::Expanding => "expanding",
            VolumeTrend::Contracting => "contracting",
            VolumeTrend::Unknown => "unknown",
        })
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Suggestion::Buy => "buy",
            Suggestion::Sell => "sell",
            Suggestion::Hold => "hold",
        })
    }
}

/// Snapshot of the latest row plus its interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub close: f64,
    /// Percent change of close against the previous row; 0 for a single row.
    pub change_pct: f64,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub trend: TrendState,
    pub rsi_zone: RsiZone,
    pub macd_bias: MacdBias,
    pub volume_trend: VolumeTrend,
    pub suggestion: Suggestion,
}

/// Which columns to read the moving averages from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendColumns {
    pub ma_short: String,
    pub ma_long: String,
    pub volume_ma: String,
}

impl TrendColumns {
    /// Shortest and longest close MA, first volume MA. Falls back to the
    /// default 5/20/5 columns when a list is empty.
    pub fn from_options(options: &IndicatorOptions) -> Self {
        let short = options.ma_windows.iter().min().copied().unwrap_or(5);
        let long = options.ma_windows.iter().max().copied().unwrap_or(20);
        let volume = options.volume_ma_windows.first().copied().unwrap_or(5);
        Self {
            ma_short: close_ma_column(short),
            ma_long: close_ma_column(long),
            volume_ma: volume_ma_column(volume),
        }
    }
}

impl Default for TrendColumns {
    fn default() -> Self {
        Self::from_options(&IndicatorOptions::default())
    }
}

/// Assess the latest row using the default column names.
///
/// Returns `None` for an empty series.
pub fn assess(series: &IndicatorSeries) -> Option<TrendReport> {
    assess_with(series, &TrendColumns::default())
}

pub fn assess_with(series: &IndicatorSeries, columns: &TrendColumns) -> Option<TrendReport> {
    let last = series.len().checked_sub(1)?;
    let point = &series.points()[last];

    let change_pct = match last.checked_sub(1).map(|i| series.points()[i].close) {
        Some(prev) if prev != 0.0 => (point.close - prev) / prev * 100.0,
        _ => 0.0,
    };

    let ma_short = series.value(&columns.ma_short, last);
    let ma_long = series.value(&columns.ma_long, last);
    let rsi = series.value(RSI_COLUMN, last);
    let macd = series.value(MACD_COLUMN, last);
    let signal = series.value(SIGNAL_COLUMN, last);
    let volume_ma = series.value(&columns.volume_ma, last);

    let trend = classify_trend(ma_short, ma_long);
    let rsi_zone = classify_rsi(rsi);
    let macd_bias = classify_macd(macd, signal);
    let volume_trend = match volume_ma {
        Some(avg) if point.volume as f64 > avg => VolumeTrend::Expanding,
        Some(_) => VolumeTrend::Contracting,
        None => VolumeTrend::Unknown,
    };

    Some(TrendReport {
        symbol: point.symbol.clone(),
        trade_date: point.trade_date,
        close: point.close,
        change_pct,
        ma_short,
        ma_long,
        rsi,
        macd,
        signal,
        bb_upper: series.value(BB_UPPER_COLUMN, last),
        bb_lower: series.value(BB_LOWER_COLUMN, last),
        trend,
        rsi_zone,
        macd_bias,
        volume_trend,
        suggestion: suggest(trend, rsi_zone, macd_bias),
    })
}

/// One report per non-empty series, in input order.
///
/// The multi-symbol counterpart of [`assess_with`]: each series contributes
/// its latest row, so the result reads as a cross-symbol summary table.
pub fn summarize<'a>(
    series: impl IntoIterator<Item = &'a IndicatorSeries>,
    columns: &TrendColumns,
) -> Vec<TrendReport> {
    series
        .into_iter()
        .filter_map(|s| assess_with(s, columns))
        .collect()
}

pub fn classify_trend(ma_short: Option<f64>, ma_long: Option<f64>) -> TrendState {
    match (ma_short, ma_long) {
        (Some(s), Some(l)) if s > l => TrendState::Bullish,
        (Some(s), Some(l)) if s < l => TrendState::Bearish,
        (Some(_), Some(_)) => TrendState::Neutral,
        _ => TrendState::Unknown,
    }
}

/// Missing RSI reads as normal.
pub fn classify_rsi(rsi: Option<f64>) -> RsiZone {
    match rsi {
        Some(v) if v > RSI_OVERBOUGHT => RsiZone::Overbought,
        Some(v) if v < RSI_OVERSOLD => RsiZone::Oversold,
        _ => RsiZone::Normal,
    }
}

pub fn classify_macd(macd: Option<f64>, signal: Option<f64>) -> MacdBias {
    match (macd, signal) {
        (Some(m), Some(s)) if m > s => MacdBias::Bullish,
        (Some(m), Some(s)) if m < s => MacdBias::Bearish,
        (Some(_), Some(_)) => MacdBias::Neutral,
        _ => MacdBias::Unknown,
    }
}

/// Buy needs all three of trend, momentum and MACD on the long side without
/// RSI being stretched; sell is the mirror image.
pub fn suggest(trend: TrendState, rsi_zone: RsiZone, macd_bias: MacdBias) -> Suggestion {
    match (trend, macd_bias) {
        (TrendState::Bullish, MacdBias::Bullish) if rsi_zone != RsiZone::Overbought => {
            Suggestion::Buy
        }
        (TrendState::Bearish, MacdBias::Bearish) if rsi_zone != RsiZone::Oversold => {
            Suggestion::Sell
        }
        _ => Suggestion::Hold,
    }
}
