//! Summary command implementation

use anyhow::Result;
use candle_years::summary;
use chrono::DateTime;
use std::path::PathBuf;
use tracing::info;

fn format_ts(ts: Option<i64>) -> String {
    ts.and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn run(output_dir: PathBuf) -> Result<()> {
    info!("Summarizing year files in: {}", output_dir.display());
    let years = summary::summarize_output(&output_dir)?;

    println!("{}", "=".repeat(60));
    println!("{:<6} {:>10}  {:<16}  {:<16}", "Year", "Records", "First", "Last");
    println!("{}", "=".repeat(60));
    for year in &years {
        println!(
            "{:<6} {:>10}  {:<16}  {:<16}",
            year.year,
            year.records,
            format_ts(year.first),
            format_ts(year.last)
        );
    }
    println!("{}", "=".repeat(60));

    let total: usize = years.iter().map(|y| y.records).sum();
    println!("{} files, {} records", years.len(), total);

    Ok(())
}
