//! Convert command implementation

use anyhow::Result;
use candle_years::{run_conversion, ConsoleReporter, ConversionConfig};
use std::path::PathBuf;
use tracing::{debug, info};

pub fn run(
    config_path: Option<PathBuf>,
    input_override: Option<PathBuf>,
    output_override: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            let config = ConversionConfig::from_file(&path)?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => ConversionConfig::default(),
    };
    let config = config.with_overrides(input_override, output_override);
    debug!("Effective configuration: {:?}", config);

    let report = run_conversion(&config, &mut ConsoleReporter::stdout())?;

    info!(
        "Wrote {} records to {} files ({} of {} rows skipped)",
        report.records_written(),
        report.files.len(),
        report.skipped.len(),
        report.rows_read
    );

    Ok(())
}
