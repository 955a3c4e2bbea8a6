//! CSV reading and row parsing
//!
//! Turns each record of an OHLC export into a [`ParsedRow`] or a
//! [`SkippedRow`]. Only I/O failures are fatal; anything wrong with an
//! individual row is reported as a skip and reading continues.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

use crate::types::{
    Candle, ParsedRow, RawRow, RowError, RowOutcome, SkippedRow, COL_CLOSE, COL_HIGH, COL_LOW,
    COL_OPEN, COL_OPEN_TIME, REQUIRED_COLUMNS,
};

// =============================================================================
// Date Parsing
// =============================================================================

/// Exchange export format, e.g. "8/17/2017 4:00" or "12/21/2025 22:15"
const SLASH_FORMAT: &str = "%m/%d/%Y %H:%M";

/// ISO-8601 layouts carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

/// ISO-8601 layouts without offset, read as naive wall-clock time
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parse an `Open time` value into `(unix_seconds, calendar_year)`.
///
/// Values containing `/` must match `M/D/YYYY H:MM`; anything else is tried
/// as ISO-8601 (extended or basic layout, hour-only times, `Z`, `+HH`,
/// `+HHMM` and `+HH:MM` offsets).
///
/// Naive values carry no zone and are converted as if they were UTC, so
/// `8/17/2017 4:00` is always `1502942400` whatever the host time zone.
/// Values with an offset yield the true epoch second, while the year is
/// taken from the offset-local calendar date.
pub fn parse_open_time(value: &str) -> Result<(i64, i32), RowError> {
    if value.contains('/') {
        let dt = NaiveDateTime::parse_from_str(value, SLASH_FORMAT).map_err(|e| {
            RowError::InvalidDate {
                value: value.to_string(),
                reason: format!("does not match format '{}': {}", SLASH_FORMAT, e),
            }
        })?;
        return Ok((dt.and_utc().timestamp(), dt.year()));
    }

    parse_iso(value).ok_or_else(|| RowError::InvalidDate {
        value: value.to_string(),
        reason: "not a valid ISO-8601 date/time".to_string(),
    })
}

/// Rewrite the ISO shorthands chrono cannot parse directly: a trailing `Z`,
/// a two-digit `+HH` offset and an hour-only extended time (`T04`).
fn normalize_iso(value: &str) -> String {
    let value = match value.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => value.to_string(),
    };

    let Some(sep) = value.find(['T', ' ']) else {
        return value;
    };
    let (date, rest) = value.split_at(sep);
    let (sep_char, time) = rest.split_at(1);
    let (clock, offset) = match time.find(['+', '-']) {
        Some(pos) => time.split_at(pos),
        None => (time, ""),
    };

    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());

    let mut normalized = format!("{}{}{}", date, sep_char, clock);
    if date.contains('-') && two_digits(clock) {
        normalized.push_str(":00");
    }
    normalized.push_str(offset);
    if offset.len() == 3 && two_digits(&offset[1..]) {
        normalized.push_str(":00");
    }
    normalized
}

fn parse_iso(value: &str) -> Option<(i64, i32)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some((dt.timestamp(), dt.year()));
    }

    let normalized = normalize_iso(value);
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some((dt.timestamp(), dt.year()));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some((dt.and_utc().timestamp(), dt.year()));
        }
    }

    DATE_ONLY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| (dt.and_utc().timestamp(), dt.year()))
}

// =============================================================================
// Row Parsing
// =============================================================================

/// Parse a price column; surrounding whitespace is ignored.
///
/// NaN and infinities are rejected since they have no JSON representation.
pub fn parse_price(column: &'static str, value: &str) -> Result<f64, RowError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| RowError::InvalidNumber {
            column,
            value: value.to_string(),
        })?;

    if !parsed.is_finite() {
        return Err(RowError::NonFinite {
            column,
            value: value.to_string(),
        });
    }

    Ok(parsed)
}

fn required<'a>(row: &'a RawRow, column: &'static str) -> Result<&'a str, RowError> {
    row.get(column).ok_or(RowError::MissingField(column))
}

/// Validate and convert one row into a candle plus its year
pub fn parse_row(row: &RawRow) -> Result<ParsedRow, RowError> {
    let open_time = required(row, COL_OPEN_TIME)?;
    let open = required(row, COL_OPEN)?;
    let high = required(row, COL_HIGH)?;
    let low = required(row, COL_LOW)?;
    let close = required(row, COL_CLOSE)?;

    let (timestamp, year) = parse_open_time(open_time)?;

    Ok(ParsedRow {
        year,
        candle: Candle {
            timestamp,
            open: parse_price(COL_OPEN, open)?,
            high: parse_price(COL_HIGH, high)?,
            low: parse_price(COL_LOW, low)?,
            close: parse_price(COL_CLOSE, close)?,
        },
    })
}

// =============================================================================
// CSV Reader
// =============================================================================

/// Streaming reader yielding one [`RowOutcome`] per CSV record.
///
/// The outer `Result` of each item is a fatal I/O failure; the inner one is
/// the per-row accept/skip decision. Records are read as bytes so a row
/// that is not valid UTF-8 can still be shown (lossily) in its warning.
pub struct CandleReader<R: io::Read> {
    records: ByteRecordsIntoIter<R>,
    headers: StringRecord,
    line: u64,
}

impl CandleReader<File> {
    /// Open a CSV file; failure to open or read its header is fatal
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to read CSV file {}", path.display()))
    }
}

impl<R: io::Read> CandleReader<R> {
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);

        let headers = reader
            .headers()
            .context("Failed to read CSV header")?
            .clone();

        Ok(CandleReader {
            records: reader.into_byte_records(),
            headers,
            line: 0,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Required columns absent from the header row
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !self.headers.iter().any(|h| h == *col))
            .collect()
    }

    fn raw_row(&self, record: &StringRecord) -> RawRow {
        self.headers.iter().zip(record.iter()).collect()
    }

    fn lossy_row(&self, record: &ByteRecord) -> RawRow {
        self.headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name, String::from_utf8_lossy(value).into_owned()))
            .collect()
    }
}

impl<R: io::Read> Iterator for CandleReader<R> {
    type Item = Result<RowOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        self.line += 1;
        let line = self.line;

        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => {
                return Some(Err(
                    anyhow::Error::new(err).context(format!("Failed to read row {}", line))
                ));
            }
            Err(err) => {
                debug!(line, error = %err, "Unreadable record");
                return Some(Ok(Err(SkippedRow {
                    line,
                    row: RawRow::default(),
                    error: RowError::Malformed(err.to_string()),
                })));
            }
        };

        let outcome = match StringRecord::from_byte_record(record) {
            Ok(record) => {
                let row = self.raw_row(&record);
                match parse_row(&row) {
                    Ok(parsed) => {
                        trace!(line, year = parsed.year, timestamp = parsed.candle.timestamp, "Parsed row");
                        Ok(parsed)
                    }
                    Err(error) => {
                        debug!(line, %error, "Rejected row");
                        Err(SkippedRow { line, row, error })
                    }
                }
            }
            Err(err) => {
                let error = RowError::Malformed(err.utf8_error().to_string());
                debug!(line, %error, "Undecodable record");
                Err(SkippedRow {
                    line,
                    row: self.lossy_row(&err.into_byte_record()),
                    error,
                })
            }
        };

        Some(Ok(outcome))
    }
}

// =============================================================================
// Tests
// =============================================================================
