//! Shared fixtures: an in-memory upstream that records every request.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::sync::Mutex;
use stockvault_core::data::{FetchOutcome, QuoteSource, SqliteStore, SymbolDirectory};
use stockvault_core::domain::PricePoint;
use stockvault_core::BackfillEngine;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn point(symbol: &str, trade_date: NaiveDate, close: f64) -> PricePoint {
    PricePoint {
        symbol: symbol.to_string(),
        trade_date,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 10_000,
    }
}

/// One point per calendar day in `[start, end]`, closes rising from `base`.
pub fn daily(symbol: &str, start: NaiveDate, end: NaiveDate, base: f64) -> Vec<PricePoint> {
    let days = (end - start).num_days();
    (0..=days)
        .map(|i| point(symbol, start + Duration::days(i), base + i as f64))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Quote source backed by a fixed set of upstream points.
///
/// `fetch` returns the stored points inside the requested range, or `NoData`
/// when none match. A forced failure makes every fetch return `Failed`. An
/// unfiltered source hands back its whole payload on every fetch, the way a
/// misbehaving provider might.
#[derive(Default)]
pub struct RecordingSource {
    upstream: Mutex<Vec<PricePoint>>,
    calls: Mutex<Vec<FetchCall>>,
    name_lookups: Mutex<Vec<String>>,
    display_name: Option<String>,
    failure: Mutex<Option<String>>,
    unfiltered: bool,
}

impl RecordingSource {
    pub fn new(upstream: Vec<PricePoint>) -> Self {
        Self {
            upstream: Mutex::new(upstream),
            ..Self::default()
        }
    }

    pub fn unfiltered(payload: Vec<PricePoint>) -> Self {
        Self {
            unfiltered: true,
            ..Self::new(payload)
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn publish(&self, points: Vec<PricePoint>) {
        self.upstream.lock().unwrap().extend(points);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn name_lookups(&self) -> Vec<String> {
        self.name_lookups.lock().unwrap().clone()
    }
}

impl QuoteSource for RecordingSource {
    fn name(&self) -> &str {
        "recording"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
        self.calls.lock().unwrap().push(FetchCall {
            symbol: symbol.to_string(),
            start,
            end,
        });

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return FetchOutcome::Failed { reason };
        }

        let rows: Vec<PricePoint> = self
            .upstream
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                self.unfiltered
                    || (p.symbol == symbol && p.trade_date >= start && p.trade_date <= end)
            })
            .cloned()
            .collect();

        if rows.is_empty() {
            FetchOutcome::NoData
        } else {
            FetchOutcome::Rows(rows)
        }
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        self.name_lookups.lock().unwrap().push(symbol.to_string());
        self.display_name
            .clone()
            .unwrap_or_else(|| symbol.to_string())
    }
}

pub type TestEngine = BackfillEngine<SqliteStore, RecordingSource>;

pub fn engine_with(source: RecordingSource) -> TestEngine {
    engine_with_directory(source, SymbolDirectory::empty())
}

pub fn engine_with_directory(source: RecordingSource, directory: SymbolDirectory) -> TestEngine {
    let store = SqliteStore::open_in_memory().unwrap();
    BackfillEngine::new(store, source, directory)
}

/// Consecutive daily points for "TEST" with the given closes and volumes.
pub fn points_from(closes: &[f64], volumes: &[u64]) -> Vec<PricePoint> {
    let start = date(2024, 1, 2);
    closes
        .iter()
        .zip(volumes.iter().chain(std::iter::repeat(&1_000)))
        .enumerate()
        .map(|(i, (&close, &volume))| PricePoint {
            symbol: "TEST".to_string(),
            trade_date: start + Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}
