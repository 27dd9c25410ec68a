//! Indicator trait and the column-oriented series it writes into.
//!
//! Indicators are pure functions: price history in, named numeric columns
//! out. Each one only adds columns, so they can be applied in any order and
//! the result is the same.

use super::pipeline::IndicatorError;
use crate::domain::PricePoint;
use crate::series::validate_points;
use serde::Serialize;
use std::collections::BTreeMap;

/// One named output column of an indicator, aligned with the input points.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Trait for indicators.
///
/// `compute` returns one or more columns, each the same length as `points`.
/// Rows without enough history hold `f64::NAN`; the first `lookback()` rows
/// are always NaN.
///
/// No value at row t may depend on rows after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "ma_20", "macd_12_26_9").
    fn name(&self) -> &str;

    /// Number of leading rows without a value.
    fn lookback(&self) -> usize;

    fn compute(&self, points: &[PricePoint]) -> Vec<Column>;
}

/// A validated price series plus the derived columns computed over it.
///
/// Absent values (warm-up, undefined) are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    points: Vec<PricePoint>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorSeries {
    /// Wrap `points` with no derived columns yet.
    ///
    /// Rejects unordered input, duplicate dates and mixed symbols.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, IndicatorError> {
        validate_points(&points)?;
        Ok(Self {
            points,
            columns: BTreeMap::new(),
        })
    }

    /// Compute `indicator` and add its columns, replacing any with the same name.
    pub fn apply(&mut self, indicator: &dyn Indicator) {
        for column in indicator.compute(&self.points) {
            debug_assert_eq!(
                column.values.len(),
                self.points.len(),
                "indicator '{}' returned a misaligned column",
                indicator.name()
            );
            let values = column
                .values
                .into_iter()
                .map(|v| if v.is_finite() { Some(v) } else { None })
                .collect();
            self.columns.insert(column.name, values);
        }
    }

    /// Builder form of [`apply`](Self::apply).
    pub fn with(mut self, indicator: &dyn Indicator) -> Self {
        self.apply(indicator);
        self
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Value of column `name` at `index`, or `None` if absent.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|v| v.get(index).copied().flatten())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let point = self.points.get(index)?.clone();
        let values = self
            .columns
            .iter()
            .filter_map(|(name, col)| {
                col.get(index)
                    .copied()
                    .flatten()
                    .map(|v| (name.clone(), v))
            })
            .collect();
        Some(IndicatorRow { point, values })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> Vec<IndicatorRow> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }
}

/// One price point with whichever derived values are present for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub point: PricePoint,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl IndicatorRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}
