//! Core data types shared by the reader, grouper and writer

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Column holding the candle open time
pub const COL_OPEN_TIME: &str = "Open time";
pub const COL_OPEN: &str = "Open";
pub const COL_HIGH: &str = "High";
pub const COL_LOW: &str = "Low";
pub const COL_CLOSE: &str = "Close";

/// Columns every input row must provide
pub const REQUIRED_COLUMNS: [&str; 5] = [COL_OPEN_TIME, COL_OPEN, COL_HIGH, COL_LOW, COL_CLOSE];

/// Reasons a single CSV row is rejected.
///
/// All variants are recoverable: the row is skipped and the run continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("could not convert '{value}' in column '{column}' to float")]
    InvalidNumber { column: &'static str, value: String },

    #[error("non-finite value '{value}' in column '{column}'")]
    NonFinite { column: &'static str, value: String },

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// OHLC candle trimmed to the fields written to the yearly files.
///
/// On the wire a candle is always the 5-element array
/// `[timestamp, open, high, low, close]`; field names are never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CandleTuple", into = "CandleTuple")]
pub struct Candle {
    /// Unix seconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

type CandleTuple = (i64, f64, f64, f64, f64);

impl From<CandleTuple> for Candle {
    fn from((timestamp, open, high, low, close): CandleTuple) -> Self {
        Candle {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }
}

impl From<Candle> for CandleTuple {
    fn from(c: Candle) -> Self {
        (c.timestamp, c.open, c.high, c.low, c.close)
    }
}

/// A successfully parsed row together with the calendar year it belongs to.
///
/// The year comes from the parsed date's calendar field, not from the
/// timestamp, so offset-qualified inputs are bucketed by their local year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRow {
    pub year: i32,
    pub candle: Candle,
}

/// One CSV record viewed as header -> value pairs, in file column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        RawRow { fields }
    }

    /// Value of the column named exactly `column`; with duplicated header
    /// names the last such column wins
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .rfind(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawRow {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for RawRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': '{}'", name, value)?;
        }
        write!(f, "}}")
    }
}

/// A rejected row: its 1-based data line number, contents and reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub row: RawRow,
    pub error: RowError,
}

/// Outcome of reading one record
pub type RowOutcome = Result<ParsedRow, SkippedRow>;
