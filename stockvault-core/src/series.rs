//! Ordered per-symbol price series.
//!
//! A `Series` holds the points of exactly one symbol, strictly increasing by
//! trade date. Gaps between dates (weekends, market holidays) are normal and
//! are never filled in.

use crate::domain::PricePoint;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Why a sequence of points is not a valid series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("duplicate trade date {date} at index {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("trade dates out of order at index {index}: {prev} then {next}")]
    Unordered {
        index: usize,
        prev: NaiveDate,
        next: NaiveDate,
    },

    #[error("mixed symbols: expected '{expected}', found '{found}' at index {index}")]
    MixedSymbols {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Check that `points` belong to one symbol and are strictly increasing by date.
pub fn validate_points(points: &[PricePoint]) -> Result<(), SeriesError> {
    let Some(first) = points.first() else {
        return Ok(());
    };

    for (i, pair) in points.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let index = i + 1;
        if next.symbol != first.symbol {
            return Err(SeriesError::MixedSymbols {
                index,
                expected: first.symbol.clone(),
                found: next.symbol.clone(),
            });
        }
        if next.trade_date == prev.trade_date {
            return Err(SeriesError::DuplicateDate {
                index,
                date: next.trade_date,
            });
        }
        if next.trade_date < prev.trade_date {
            return Err(SeriesError::Unordered {
                index,
                prev: prev.trade_date,
                next: next.trade_date,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    symbol: String,
    points: Vec<PricePoint>,
}

impl Series {
    /// Build a series, rejecting unordered, duplicated or mixed-symbol input.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.symbol != symbol) {
            return Err(SeriesError::MixedSymbols {
                index,
                expected: symbol,
                found: p.symbol.clone(),
            });
        }
        validate_points(&points)?;
        Ok(Self { symbol, points })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.trade_date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.trade_date)
    }

    /// True when the series reaches `end`. A series that stops short is
    /// still valid; the provider may simply have nothing newer.
    pub fn covers_through(&self, end: NaiveDate) -> bool {
        self.last_date().is_some_and(|d| d >= end)
    }
}
