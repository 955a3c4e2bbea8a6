//! Candle Years
//!
//! Converts a flat OHLC candle CSV export into compact per-year JSON files
//! of `[timestamp, open, high, low, close]` tuples, for charting and
//! backtesting front-ends that load one year at a time.

pub mod config;
pub mod convert;
pub mod data;
pub mod grouping;
pub mod summary;
pub mod types;
pub mod writer;

pub use config::ConversionConfig;
pub use convert::{run_conversion, ConsoleReporter, ConversionObserver, ConversionReport};
pub use grouping::YearBuckets;
pub use types::*;
