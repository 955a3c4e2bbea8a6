//! Candle years - main entry point
//!
//! This binary provides two subcommands:
//! - convert: Split a candle CSV into per-year JSON files (default)
//! - summary: Report record counts and time ranges of existing year files

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "candle-years")]
#[command(about = "Split OHLC candle CSV exports into compact per-year JSON files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a timestamped file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert the candle CSV into <year>.json files
    Convert {
        /// Path to JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV (overrides config file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (overrides config file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize year files in an output directory
    Summary {
        /// Output directory to inspect
        #[arg(short, long, default_value = candle_years::config::DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

fn setup_logging(verbose: bool, command_name: &str, log_dir: Option<&PathBuf>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the conversion progress lines; logs go to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let log_filename = format!(
                "{}_{}.log",
                command_name,
                chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
            );
            let file_appender = tracing_appender::rolling::never(dir, &log_filename);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    if let Some(dir) = log_dir {
        info!("Log directory: {}", dir.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Some(Commands::Summary { .. }) => "summary",
        _ => "convert",
    };

    setup_logging(cli.verbose, command_name, cli.log_dir.as_ref())?;

    match cli.command {
        None => commands::convert::run(None, None, None),

        Some(Commands::Convert {
            config,
            input,
            output,
        }) => commands::convert::run(config, input, output),

        Some(Commands::Summary { output }) => commands::summary::run(output),
    }
}
