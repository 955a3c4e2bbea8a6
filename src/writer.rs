//! Yearly JSON output
//!
//! Each year is written to `<year>.json` as a compact JSON array of
//! `[timestamp, open, high, low, close]` arrays. Existing files are
//! overwritten.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::convert::ConversionObserver;
use crate::grouping::YearBuckets;
use crate::types::Candle;

/// A year file that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub year: i32,
    pub path: PathBuf,
    pub records: usize,
}

impl WrittenFile {
    pub fn file_name(&self) -> String {
        year_file_name(self.year)
    }
}

pub fn year_file_name(year: i32) -> String {
    format!("{}.json", year)
}

/// Create the output directory and any missing parents
pub fn prepare_output_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Write one year's candles to `<dir>/<year>.json`
pub fn write_year_file(dir: impl AsRef<Path>, year: i32, candles: &[Candle]) -> Result<WrittenFile> {
    let path = dir.as_ref().join(year_file_name(year));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, candles)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    debug!(year, records = candles.len(), path = %path.display(), "Wrote year file");

    Ok(WrittenFile {
        year,
        path,
        records: candles.len(),
    })
}

/// Write every bucket in ascending year order, notifying `observer` after
/// each file. Stops at the first failure; earlier files stay on disk.
pub fn write_year_files(
    buckets: &YearBuckets,
    dir: impl AsRef<Path>,
    observer: &mut dyn ConversionObserver,
) -> Result<Vec<WrittenFile>> {
    let dir = dir.as_ref();
    prepare_output_dir(dir)?;

    let mut written = Vec::with_capacity(buckets.len());
    for (year, candles) in buckets.iter() {
        let file = write_year_file(dir, year, candles)?;
        observer.on_file_written(&file);
        written.push(file);
    }
    Ok(written)
}
