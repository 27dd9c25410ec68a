//! Domain types shared by the store, the quote source, the engine and the
//! indicator pipeline.

pub mod price;

pub use price::{PricePoint, SymbolInfo};
