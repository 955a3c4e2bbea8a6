//! Integration tests for the candle-years conversion
//!
//! These tests run the full CSV -> yearly JSON pipeline against scratch
//! directories and check the files it leaves behind.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use tempfile::{tempdir, TempDir};

use candle_years::convert::Silent;
use candle_years::summary;
use candle_years::{
    run_conversion, Candle, ConsoleReporter, ConversionConfig, ConversionReport, RowError,
};

// =============================================================================
// Test Utilities
// =============================================================================

const HEADER: &str = "Open time,Open,High,Low,Close,Volume,Close time";

/// Write a CSV with the standard header plus `rows` into a fresh temp dir
fn setup(rows: &[&str]) -> (TempDir, ConversionConfig) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input").join("candles.csv");
    fs::create_dir_all(input.parent().unwrap()).unwrap();

    let mut contents = String::from(HEADER);
    contents.push('\n');
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    fs::write(&input, contents).unwrap();

    let output = dir.path().join("output");
    (dir, ConversionConfig::new(input, output))
}

fn read_year(dir: &Path, year: i32) -> Vec<Candle> {
    summary::load_year_file(dir.join(format!("{}.json", year))).unwrap()
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Run the conversion with the console reporter writing into memory
fn run_with_console(config: &ConversionConfig) -> (ConversionReport, String) {
    let mut reporter = ConsoleReporter::new(Vec::new());
    let report = run_conversion(config, &mut reporter).unwrap();
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    (report, output)
}

fn warning_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|l| l.starts_with("Warning: Could not parse row: "))
        .collect()
}

// =============================================================================
// Record Format
// =============================================================================

#[test]
fn test_reference_row_round_trip() {
    let (_dir, config) = setup(&["8/17/2017 4:00,300.0,310.0,295.0,305.0,1200.5,8/17/2017 4:14"]);

    run_conversion(&config, &mut Silent).unwrap();

    let contents = fs::read_to_string(config.output_dir.join("2017.json")).unwrap();
    assert_eq!(contents, "[[1502942400,300.0,310.0,295.0,305.0]]");
}

#[test]
fn test_every_record_is_five_element_array() {
    let (_dir, config) = setup(&[
        "8/17/2017 4:00,300.0,310.0,295.0,305.0,1,x",
        "8/17/2017 4:15,305.0,306.0,301.25,302.5,1,x",
    ]);

    run_conversion(&config, &mut Silent).unwrap();

    let contents = fs::read_to_string(config.output_dir.join("2017.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        let fields = record.as_array().unwrap();
        assert_eq!(fields.len(), 5);
        assert!(fields[0].is_i64());
        assert!(fields[1..].iter().all(|f| f.is_f64()));
    }
    assert!(!contents.contains(' '));
    assert!(!contents.ends_with('\n'));
}

#[test]
fn test_integer_prices_are_written_as_floats() {
    let (_dir, config) = setup(&["1/2/2019 0:00,100,110,90,105,1,x"]);

    run_conversion(&config, &mut Silent).unwrap();

    let contents = fs::read_to_string(config.output_dir.join("2019.json")).unwrap();
    assert_eq!(contents, "[[1546387200,100.0,110.0,90.0,105.0]]");
}

// =============================================================================
// Grouping
// =============================================================================

#[test]
fn test_records_land_in_their_year_in_file_order() {
    let (_dir, config) = setup(&[
        "12/31/2017 23:30,1.0,1.0,1.0,1.0,1,x",
        "1/1/2018 0:00,2.0,2.0,2.0,2.0,1,x",
        "12/31/2017 23:45,3.0,3.0,3.0,3.0,1,x",
        "2018-01-01 00:15:00,4.0,4.0,4.0,4.0,1,x",
        "12/31/2017 23:15,5.0,5.0,5.0,5.0,1,x",
    ]);

    run_conversion(&config, &mut Silent).unwrap();

    let opens_2017: Vec<f64> = read_year(&config.output_dir, 2017).iter().map(|c| c.open).collect();
    let opens_2018: Vec<f64> = read_year(&config.output_dir, 2018).iter().map(|c| c.open).collect();
    assert_eq!(opens_2017, vec![1.0, 3.0, 5.0]);
    assert_eq!(opens_2018, vec![2.0, 4.0]);
}

#[test]
fn test_file_set_matches_parsed_years() {
    let (_dir, config) = setup(&[
        "6/1/2019 12:00,1,1,1,1,1,x",
        "garbage,1,1,1,1,1,x",
        "6/1/2021 12:00,1,1,1,1,1,x",
        "6/1/2020 12:00,oops,1,1,1,1,x",
    ]);

    let report = run_conversion(&config, &mut Silent).unwrap();

    // 2020 only had a bad row, so no file
    assert_eq!(output_files(&config.output_dir), vec!["2019.json", "2021.json"]);
    let years: Vec<i32> = report.files.iter().map(|f| f.year).collect();
    assert_eq!(years, vec![2019, 2021]);
}

#[test]
fn test_mixed_date_formats() {
    let (_dir, config) = setup(&[
        "8/17/2017 4:00,1,1,1,1,1,x",
        "2017-08-17T04:15:00,2,2,2,2,1,x",
        "2017-08-17T04:30:00Z,3,3,3,3,1,x",
    ]);

    run_conversion(&config, &mut Silent).unwrap();

    let stamps: Vec<i64> = read_year(&config.output_dir, 2017)
        .iter()
        .map(|c| c.timestamp)
        .collect();
    assert_eq!(stamps, vec![1502942400, 1502943300, 1502944200]);
}

// =============================================================================
// Skip Behaviour
// =============================================================================

#[test]
fn test_bad_rows_warn_once_and_continue() {
    let (_dir, config) = setup(&[
        "not-a-date,1,1,1,1,1,x",
        "8/17/2017 4:00,300.0,310.0,295.0,305.0,1,x",
        "8/17/2017 4:15,1,,1,1,1,x",
        "8/17/2017 4:30,301.0,302.0,300.5,301.5,1,x",
    ]);

    let (report, output) = run_with_console(&config);
    let warnings = warning_lines(&output);

    assert_eq!(warnings.len(), 2);
    assert_eq!(
        warnings[0],
        "Warning: Could not parse row: {'Open time': 'not-a-date', 'Open': '1', 'High': '1', \
         'Low': '1', 'Close': '1', 'Volume': '1', 'Close time': 'x'}. \
         Error: invalid date 'not-a-date': not a valid ISO-8601 date/time"
    );
    assert!(warnings[1].ends_with("Error: could not convert '' in column 'High' to float"));

    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].line, 1);
    assert!(matches!(report.skipped[0].error, RowError::InvalidDate { .. }));
    assert_eq!(read_year(&config.output_dir, 2017).len(), 2);
}

#[test]
fn test_missing_required_column_skips_every_row() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("no_close.csv");
    fs::write(&input, "Open time,Open,High,Low\n8/17/2017 4:00,1,2,0.5\n8/17/2017 4:15,1,2,0.5\n").unwrap();
    let config = ConversionConfig::new(&input, dir.path().join("out"));

    let report = run_conversion(&config, &mut Silent).unwrap();

    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|s| s.error == RowError::MissingField("Close")));
    assert!(report.files.is_empty());
}

#[test]
fn test_extra_columns_and_reordered_header() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("reordered.csv");
    fs::write(
        &input,
        "Close,Ignore,Low,High,Open,Open time\n305.0,zzz,295.0,310.0,300.0,8/17/2017 4:00\n",
    )
    .unwrap();
    let config = ConversionConfig::new(&input, dir.path().join("out"));

    run_conversion(&config, &mut Silent).unwrap();

    let candles = read_year(&config.output_dir, 2017);
    assert_eq!(candles.len(), 1);
    assert_relative_eq!(candles[0].open, 300.0);
    assert_relative_eq!(candles[0].high, 310.0);
    assert_relative_eq!(candles[0].low, 295.0);
    assert_relative_eq!(candles[0].close, 305.0);
}

// =============================================================================
// Output Contract
// =============================================================================

#[test]
fn test_rerun_is_byte_identical() {
    let (_dir, config) = setup(&[
        "8/17/2017 4:00,300.0,310.0,295.0,305.0,1,x",
        "3/5/2018 13:45,0.1,0.30000000000000004,0.05,0.2,1,x",
    ]);

    run_conversion(&config, &mut Silent).unwrap();
    let first_2017 = fs::read(config.output_dir.join("2017.json")).unwrap();
    let first_2018 = fs::read(config.output_dir.join("2018.json")).unwrap();

    run_conversion(&config, &mut Silent).unwrap();
    assert_eq!(fs::read(config.output_dir.join("2017.json")).unwrap(), first_2017);
    assert_eq!(fs::read(config.output_dir.join("2018.json")).unwrap(), first_2018);
}

#[test]
fn test_stale_year_file_is_overwritten() {
    let (_dir, config) = setup(&["8/17/2017 4:00,300.0,310.0,295.0,305.0,1,x"]);
    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(config.output_dir.join("2017.json"), "[[0,0.0,0.0,0.0,0.0],[1,1.0,1.0,1.0,1.0]]").unwrap();

    run_conversion(&config, &mut Silent).unwrap();

    assert_eq!(read_year(&config.output_dir, 2017).len(), 1);
}

#[test]
fn test_unwritable_output_is_fatal() {
    let (dir, mut config) = setup(&["8/17/2017 4:00,300.0,310.0,295.0,305.0,1,x"]);
    let blocker: PathBuf = dir.path().join("blocker");
    fs::write(&blocker, "file in the way").unwrap();
    config.output_dir = blocker.join("output");

    let err = run_conversion(&config, &mut Silent).unwrap_err();
    assert!(err.to_string().contains("Failed to create output directory"));
}

// =============================================================================
// End-to-End
// =============================================================================

#[test]
fn test_end_to_end_two_years_one_bad_row() {
    let (_dir, config) = setup(&[
        "12/31/2017 23:45,700.0,712.5,698.0,710.0,55.1,12/31/2017 23:59",
        "13/45/2017 99:99,1.0,1.0,1.0,1.0,1.0,x",
        "1/1/2018 0:00,710.0,720.0,705.0,715.0,60.2,1/1/2018 0:14",
    ]);

    let (report, output) = run_with_console(&config);

    assert_eq!(output_files(&config.output_dir), vec!["2017.json", "2018.json"]);
    assert_eq!(read_year(&config.output_dir, 2017).len(), 1);
    assert_eq!(read_year(&config.output_dir, 2018).len(), 1);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], format!("Reading CSV file: {}", config.input_path.display()));
    assert!(lines[1].starts_with(
        "Warning: Could not parse row: {'Open time': '13/45/2017 99:99', 'Open': '1.0'"
    ));
    assert!(lines[1].contains(
        "Error: invalid date '13/45/2017 99:99': does not match format '%m/%d/%Y %H:%M'"
    ));
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], format!("Writing JSON files to: {}", config.output_dir.display()));
    assert_eq!(lines[4], "  Created 2017.json with 1 records");
    assert_eq!(lines[5], "  Created 2018.json with 1 records");
    assert_eq!(lines[6], "");
    assert_eq!(lines[7], "Conversion complete! Created 2 JSON files.");
    assert_eq!(warning_lines(&output).len(), 1);
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.records_written(), 2);

    let all = summary::load_all_years(&config.output_dir).unwrap();
    assert_eq!(all.first().map(|c| c.timestamp), Some(1514763900));
    assert_eq!(all.last().map(|c| c.timestamp), Some(1514764800));
}

#[test]
fn test_summary_of_converted_output() {
    let (_dir, config) = setup(&[
        "8/17/2017 4:00,1,1,1,1,1,x",
        "8/17/2017 4:15,1,1,1,1,1,x",
        "1/1/2020 0:00,1,1,1,1,1,x",
    ]);

    run_conversion(&config, &mut Silent).unwrap();
    let years = summary::summarize_output(&config.output_dir).unwrap();

    let overview: Vec<(i32, usize, Option<i64>, Option<i64>)> = years
        .iter()
        .map(|y| (y.year, y.records, y.first, y.last))
        .collect();
    assert_eq!(
        overview,
        vec![
            (2017, 2, Some(1502942400), Some(1502943300)),
            (2020, 1, Some(1577836800), Some(1577836800)),
        ]
    );
}
