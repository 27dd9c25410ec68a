//! SQLite-backed series store.
//!
//! Layout:
//! - `symbol_info(symbol PK, display_name, industry, market_type, listing_date)`
//! - `price_daily(symbol, trade_date, open, high, low, close, volume)` with
//!   `PRIMARY KEY (symbol, trade_date)`
//!
//! Dates are stored as ISO `YYYY-MM-DD` text, so lexical order is date order.

use super::store::{SeriesStore, StoreError};
use crate::domain::{PricePoint, SymbolInfo};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS symbol_info (
    symbol        TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL,
    industry      TEXT NOT NULL DEFAULT 'unknown',
    market_type   TEXT NOT NULL,
    listing_date  TEXT
);

CREATE TABLE IF NOT EXISTS price_daily (
    symbol      TEXT NOT NULL,
    trade_date  TEXT NOT NULL,
    open        REAL NOT NULL,
    high        REAL NOT NULL,
    low         REAL NOT NULL,
    close       REAL NOT NULL,
    volume      INTEGER NOT NULL,
    PRIMARY KEY (symbol, trade_date)
);
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO price_daily (symbol, trade_date, open, high, low, close, volume)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(symbol, trade_date) DO UPDATE SET
    open   = excluded.open,
    high   = excluded.high,
    low    = excluded.low,
    close  = excluded.close,
    volume = excluded.volume
"#;

type RawRow = (String, NaiveDate, f64, f64, f64, f64, i64);

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories and
    /// the schema as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        debug!(path = %path.display(), "price store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    /// On-disk location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Number of stored points for `symbol`.
    pub fn row_count(&self, symbol: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM price_daily WHERE symbol = ?1",
            [symbol],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

fn raw_to_point(raw: RawRow) -> Result<PricePoint, StoreError> {
    let (symbol, trade_date, open, high, low, close, volume) = raw;
    let volume = u64::try_from(volume).map_err(|_| StoreError::Corrupt {
        symbol: symbol.clone(),
        reason: format!("negative volume {volume} on {trade_date}"),
    })?;
    Ok(PricePoint {
        symbol,
        trade_date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn row_to_info(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymbolInfo> {
    Ok(SymbolInfo {
        symbol: row.get(0)?,
        display_name: row.get(1)?,
        industry: row.get(2)?,
        market_type: row.get(3)?,
        listing_date: row.get(4)?,
    })
}

impl SeriesStore for SqliteStore {
    fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT symbol, trade_date, open, high, low, close, volume \
             FROM price_daily \
             WHERE symbol = ?1 AND trade_date BETWEEN ?2 AND ?3 \
             ORDER BY trade_date ASC",
        )?;
        let rows = stmt.query_map(params![symbol, start, end], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?;

        let mut points = Vec::new();
        for raw in rows {
            points.push(raw_to_point(raw?)?);
        }
        Ok(points)
    }

    fn upsert(&self, rows: &[PricePoint]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for p in rows {
                let volume = i64::try_from(p.volume).map_err(|_| StoreError::Corrupt {
                    symbol: p.symbol.clone(),
                    reason: format!("volume {} exceeds storable range", p.volume),
                })?;
                stmt.execute(params![
                    p.symbol,
                    p.trade_date,
                    p.open,
                    p.high,
                    p.low,
                    p.close,
                    volume,
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = rows.len(), "upserted price rows");
        Ok(rows.len())
    }

    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let latest: Option<NaiveDate> = self.conn.query_row(
            "SELECT MAX(trade_date) FROM price_daily WHERE symbol = ?1",
            [symbol],
            |row| row.get(0),
        )?;
        Ok(latest)
    }

    fn has_rows_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM price_daily \
             WHERE symbol = ?1 AND trade_date BETWEEN ?2 AND ?3)",
            params![symbol, start, end],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, StoreError> {
        let info = self
            .conn
            .query_row(
                "SELECT symbol, display_name, industry, market_type, listing_date \
                 FROM symbol_info WHERE symbol = ?1",
                [symbol],
                row_to_info,
            )
            .optional()?;
        Ok(info)
    }

    fn ensure_symbol_metadata(
        &self,
        symbol: &str,
        display_name: &str,
        market_type: &str,
    ) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO symbol_info (symbol, display_name, industry, market_type) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                symbol,
                display_name,
                SymbolInfo::UNKNOWN_INDUSTRY,
                market_type
            ],
        )?;
        if inserted > 0 {
            info!(symbol, display_name, market_type, "registered new symbol");
        }
        Ok(inserted > 0)
    }

    fn tracked_symbols(&self) -> Result<Vec<SymbolInfo>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT symbol, display_name, industry, market_type, listing_date \
             FROM symbol_info ORDER BY symbol",
        )?;
        let infos = stmt
            .query_map([], row_to_info)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(infos)
    }
}
