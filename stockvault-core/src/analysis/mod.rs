//! Interpretation of computed indicators.

pub mod trend;

pub use trend::{
    assess, assess_with, summarize, MacdBias, RsiZone, Suggestion, TrendColumns, TrendReport,
    TrendState, VolumeTrend,
};
