//! Conversion configuration
//!
//! The input CSV and output directory are carried in an explicit
//! [`ConversionConfig`] handed to the pipeline by the caller. Defaults match
//! the historical ETH 15m export layout; a JSON file and CLI flags can
//! override either path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATH: &str = "data/eth/input/eth_15m_data_2017_to_2025.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data/eth/output";

/// Paths for one conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ConversionConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        ConversionConfig {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Load configuration from JSON file
    ///
    /// Keys absent from the file keep their default values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ConversionConfig =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(mut self, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(input) = input {
            self.input_path = input;
        }
        if let Some(output) = output {
            self.output_dir = output;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            anyhow::bail!("input_path must not be empty");
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output_dir must not be empty");
        }
        if self.input_path == self.output_dir {
            anyhow::bail!(
                "input_path and output_dir point at the same location: {}",
                self.input_path.display()
            );
        }
        Ok(())
    }
}
