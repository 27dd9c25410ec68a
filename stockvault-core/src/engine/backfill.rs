//! Completeness and incremental backfill.
//!
//! The engine answers "give me `[start, end]` for this symbol" by checking the
//! store first and fetching only what is missing at the tail. Upstream gaps
//! inside an already populated range are left alone.

use super::{EngineError, IntoTradeDate};
use crate::data::{
    exchange_suffix, sanitize_rows, FetchOutcome, QuoteSource, SeriesStore, SymbolDirectory,
};
use crate::series::Series;
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Days fetched when a symbol has no stored history at all.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Result of a sweep over every tracked symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub checked: usize,
    pub refreshed: usize,
    pub up_to_date: usize,
}

pub struct BackfillEngine<S, Q> {
    store: S,
    source: Q,
    directory: SymbolDirectory,
    lookback_days: i64,
}

impl<S: SeriesStore, Q: QuoteSource> BackfillEngine<S, Q> {
    pub fn new(store: S, source: Q, directory: SymbolDirectory) -> Self {
        Self {
            store,
            source,
            directory,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &Q {
        &self.source
    }

    pub fn directory(&self) -> &SymbolDirectory {
        &self.directory
    }

    /// Guarantee the store covers `[start, end]` as far as the provider
    /// allows, then return the stored series for that range.
    ///
    /// An empty range in the store triggers a full fetch; otherwise only the
    /// tail after the latest stored date in range is requested. A series
    /// shorter than the range is a normal result (holidays, future dates,
    /// delisted symbols).
    #[instrument(skip(self, start, end))]
    pub fn ensure_range(
        &self,
        symbol: &str,
        start: impl IntoTradeDate,
        end: impl IntoTradeDate,
    ) -> Result<Series, EngineError> {
        let symbol = validate_symbol(symbol)?;
        let start = start.into_trade_date()?;
        let end = end.into_trade_date()?;
        if start > end {
            return Err(EngineError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }

        if !self.store.has_rows_in_range(symbol, start, end)? {
            debug!(%start, %end, "no stored rows in range, fetching all of it");
            self.fetch_and_store(symbol, start, end)?;
        } else {
            let stored = self.store.load(symbol, start, end)?;
            if let Some(latest) = stored.last().map(|p| p.trade_date) {
                if latest < end {
                    let tail_start = latest + Duration::days(1);
                    debug!(%latest, %tail_start, %end, "tail missing, fetching");
                    self.fetch_and_store(symbol, tail_start, end)?;
                }
            }
        }

        let points = self.store.load(symbol, start, end)?;
        Ok(Series::new(symbol, points)?)
    }

    /// [`refresh_if_stale_at`](Self::refresh_if_stale_at) with today's local date.
    pub fn refresh_if_stale(&self, symbol: &str, tolerance_days: i64) -> Result<bool, EngineError> {
        self.refresh_if_stale_at(symbol, tolerance_days, Local::now().date_naive())
    }

    /// Bring `symbol` up to `today` if its latest stored date trails by more
    /// than `tolerance_days`. Symbols with no history get the lookback window.
    ///
    /// Returns true when a fetch was issued, whether or not it produced rows.
    #[instrument(skip(self))]
    pub fn refresh_if_stale_at(
        &self,
        symbol: &str,
        tolerance_days: i64,
        today: NaiveDate,
    ) -> Result<bool, EngineError> {
        let symbol = validate_symbol(symbol)?;

        let start = match self.store.latest_date(symbol)? {
            Some(latest) => {
                let age = (today - latest).num_days();
                if age <= tolerance_days {
                    debug!(%latest, age, "up to date");
                    return Ok(false);
                }
                latest + Duration::days(1)
            }
            None => today - Duration::days(self.lookback_days),
        };

        info!(%start, %today, "stale, refreshing");
        self.fetch_and_store(symbol, start, today)?;
        Ok(true)
    }

    /// [`refresh_all_at`](Self::refresh_all_at) with today's local date.
    pub fn refresh_all(&self, tolerance_days: i64) -> Result<SweepSummary, EngineError> {
        self.refresh_all_at(tolerance_days, Local::now().date_naive())
    }

    /// Refresh every tracked symbol, one after another.
    ///
    /// A storage failure aborts the sweep; upstream failures only leave the
    /// affected symbol stale.
    #[instrument(skip(self))]
    pub fn refresh_all_at(
        &self,
        tolerance_days: i64,
        today: NaiveDate,
    ) -> Result<SweepSummary, EngineError> {
        let tracked = self.store.tracked_symbols()?;
        let mut summary = SweepSummary::default();

        for info in &tracked {
            summary.checked += 1;
            if self.refresh_if_stale_at(&info.symbol, tolerance_days, today)? {
                summary.refreshed += 1;
            } else {
                summary.up_to_date += 1;
            }
        }

        info!(
            checked = summary.checked,
            refreshed = summary.refreshed,
            up_to_date = summary.up_to_date,
            "sweep finished"
        );
        Ok(summary)
    }

    /// The single fetch/persist path shared by backfill and refresh.
    ///
    /// Returns the number of rows written. `NoData` and `Failed` both write
    /// nothing; failures are logged so a persistently broken upstream stays
    /// visible. Fetched rows are sanitized first: only finite rows for
    /// `symbol` inside `[start, end]` reach the store, and a payload with
    /// none of those counts as `NoData`.
    fn fetch_and_store(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, EngineError> {
        let rows = match self.source.fetch(symbol, start, end) {
            FetchOutcome::Rows(rows) => {
                let received = rows.len();
                let rows = sanitize_rows(symbol, start, end, rows);
                if rows.is_empty() {
                    warn!(symbol, %start, %end, received, source = self.source.name(), "provider returned no usable rows");
                    return Ok(0);
                }
                rows
            }
            FetchOutcome::NoData => {
                info!(symbol, %start, %end, source = self.source.name(), "provider returned no data");
                return Ok(0);
            }
            FetchOutcome::Failed { reason } => {
                warn!(symbol, %start, %end, source = self.source.name(), %reason, "fetch failed, keeping stored data");
                return Ok(0);
            }
        };

        self.ensure_metadata(symbol)?;
        let written = self.store.upsert(&rows)?;
        info!(symbol, rows = written, %start, %end, "stored fetched rows");
        Ok(written)
    }

    /// Create the symbol record on first sight. The directory wins; otherwise
    /// the provider's name and the exchange suffix stand in.
    fn ensure_metadata(&self, symbol: &str) -> Result<(), EngineError> {
        if self.store.symbol_info(symbol)?.is_some() {
            return Ok(());
        }

        let (display_name, market_type) = match self.directory.lookup(symbol) {
            Some(entry) => (entry.name.clone(), entry.market_type.clone()),
            None => (
                self.source.resolve_display_name(symbol),
                exchange_suffix(symbol).unwrap_or(symbol).to_string(),
            ),
        };

        self.store
            .ensure_symbol_metadata(symbol, &display_name, &market_type)?;
        Ok(())
    }
}

fn validate_symbol(symbol: &str) -> Result<&str, EngineError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidRequest("symbol must not be empty".into()));
    }
    Ok(trimmed)
}
