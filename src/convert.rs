//! CSV to yearly JSON conversion pipeline
//!
//! One forward pass: read and parse every row, bucket candles by year, then
//! write one file per year. Progress is reported through a
//! [`ConversionObserver`] so callers decide what reaches the console.

use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::data::CandleReader;
use crate::grouping::YearBuckets;
use crate::types::SkippedRow;
use crate::writer::{self, WrittenFile};

/// Result of a completed conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Data rows seen, accepted or not
    pub rows_read: u64,
    pub skipped: Vec<SkippedRow>,
    pub files: Vec<WrittenFile>,
}

impl ConversionReport {
    pub fn records_written(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }
}

/// Hooks invoked at each pipeline stage
pub trait ConversionObserver {
    fn on_reading(&mut self, _input: &Path) {}
    fn on_skip(&mut self, _skipped: &SkippedRow) {}
    fn on_writing(&mut self, _output_dir: &Path) {}
    fn on_file_written(&mut self, _file: &WrittenFile) {}
    fn on_complete(&mut self, _report: &ConversionReport) {}
}

/// Observer that ignores every event
pub struct Silent;

impl ConversionObserver for Silent {}

// =============================================================================
// Console Lines
// =============================================================================

pub fn reading_line(input: &Path) -> String {
    format!("Reading CSV file: {}", input.display())
}

pub fn skip_line(skipped: &SkippedRow) -> String {
    format!(
        "Warning: Could not parse row: {}. Error: {}",
        skipped.row, skipped.error
    )
}

pub fn writing_line(output_dir: &Path) -> String {
    format!("\nWriting JSON files to: {}", output_dir.display())
}

pub fn file_written_line(file: &WrittenFile) -> String {
    format!("  Created {} with {} records", file.file_name(), file.records)
}

pub fn complete_line(report: &ConversionReport) -> String {
    format!(
        "\nConversion complete! Created {} JSON files.",
        report.files.len()
    )
}

/// Writes the human-readable progress lines to a sink, stdout by default
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        ConsoleReporter { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        ConsoleReporter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: String) {
        // write failures are logged, never propagated
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!("Failed to write progress line: {}", e);
        }
    }
}

impl<W: Write> ConversionObserver for ConsoleReporter<W> {
    fn on_reading(&mut self, input: &Path) {
        self.emit(reading_line(input));
    }

    fn on_skip(&mut self, skipped: &SkippedRow) {
        self.emit(skip_line(skipped));
    }

    fn on_writing(&mut self, output_dir: &Path) {
        self.emit(writing_line(output_dir));
    }

    fn on_file_written(&mut self, file: &WrittenFile) {
        self.emit(file_written_line(file));
    }

    fn on_complete(&mut self, report: &ConversionReport) {
        self.emit(complete_line(report));
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Read `config.input_path`, group by year and write `config.output_dir`.
///
/// Unparseable rows are skipped and reported; failing to open the input or
/// to write any output file aborts the run. Files already written before a
/// fatal error are left in place.
pub fn run_conversion(
    config: &ConversionConfig,
    observer: &mut dyn ConversionObserver,
) -> Result<ConversionReport> {
    config.validate()?;

    let mut report = ConversionReport::default();

    observer.on_reading(&config.input_path);
    info!("Reading candles from {}", config.input_path.display());

    let reader = CandleReader::from_path(&config.input_path)?;
    let missing = reader.missing_columns();
    if !missing.is_empty() {
        warn!("Input header is missing required columns: {:?}", missing);
    }

    let mut buckets = YearBuckets::new();
    for outcome in reader {
        report.rows_read += 1;
        match outcome? {
            Ok(parsed) => buckets.push(parsed),
            Err(skipped) => {
                observer.on_skip(&skipped);
                report.skipped.push(skipped);
            }
        }
    }

    info!(
        "Parsed {} candles across {} years ({} rows skipped)",
        buckets.total_candles(),
        buckets.len(),
        report.skipped.len()
    );

    observer.on_writing(&config.output_dir);
    report.files = writer::write_year_files(&buckets, &config.output_dir, observer)?;

    debug!(files = report.files.len(), "Conversion finished");
    observer.on_complete(&report);

    Ok(report)
}
