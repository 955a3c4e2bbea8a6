//! Reading yearly output back
//!
//! Mirrors what downstream chart consumers do with the output directory:
//! load each `<year>.json`, map the 5-tuples back to candles and stitch the
//! years together by timestamp.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::types::Candle;

/// Per-year statistics of one output file
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    pub path: PathBuf,
    pub records: usize,
    /// First and last candle timestamps in file order
    pub first: Option<i64>,
    pub last: Option<i64>,
}

/// Year encoded in a file name like `2017.json`
pub fn year_from_file_name(name: &str) -> Option<i32> {
    let stem = name.strip_suffix(".json")?;
    if stem.len() != 4 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

pub fn load_year_file(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open year file {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse year file {}", path.display()))
}

/// Year files present in `dir`, ascending by year
pub fn year_files(dir: impl AsRef<Path>) -> Result<Vec<(i32, PathBuf)>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read output directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let year = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(year_from_file_name);
        if let Some(year) = year {
            files.push((year, path));
        }
    }

    files.sort_by_key(|(year, _)| *year);
    Ok(files)
}

pub fn summarize_output(dir: impl AsRef<Path>) -> Result<Vec<YearSummary>> {
    year_files(dir)?
        .into_iter()
        .map(|(year, path)| {
            let candles = load_year_file(&path)?;
            Ok(YearSummary {
                year,
                records: candles.len(),
                first: candles.first().map(|c| c.timestamp),
                last: candles.last().map(|c| c.timestamp),
                path,
            })
        })
        .collect()
}

/// Every year's candles combined and stably sorted by timestamp
pub fn load_all_years(dir: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let mut all = Vec::new();
    for (_, path) in year_files(dir)? {
        all.extend(load_year_file(&path)?);
    }
    all.sort_by_key(|c| c.timestamp);
    Ok(all)
}
