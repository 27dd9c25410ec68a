//! Persistence, upstream quotes and the symbol directory.

pub mod circuit_breaker;
pub mod directory;
pub mod provider;
pub mod sqlite;
pub mod store;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use directory::{base_code, exchange_suffix, DirectoryEntry, DirectoryError, SymbolDirectory};
pub use provider::{sanitize_rows, DataError, FetchOutcome, QuoteSource};
pub use sqlite::SqliteStore;
pub use store::{SeriesStore, StoreError};
pub use yahoo::YahooQuoteSource;
