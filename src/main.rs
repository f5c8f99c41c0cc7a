//! cosmic-cfp CLI - COSMIC Function Point calculator
//!
//! Loads a measurement definition, computes CFP and writes the report
//! workbook.
//!
//! Usage:
//!   cosmic-cfp [OPTIONS] <INPUT>

use std::io::stdout;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cosmic_cfp::{
    CosmicCalculator, CosmicConfig, ExportOptions, OutputFormat, export, generate_summary,
    load_config, load_config_file, load_measurement,
};

/// cosmic-cfp - Measure functional size in COSMIC Function Points
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the measurement definition (YAML or JSON)
    input: PathBuf,

    /// Output file for the report (default: cosmic_measurement.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print a CFP summary to stdout
    #[arg(short, long)]
    summary: bool,

    /// Don't write a report file (use with --summary)
    #[arg(long)]
    no_write: bool,

    /// Config file path (default: search for .cosmic.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show timing information
    #[arg(long)]
    timing: bool,
}

/// Log filter: `RUST_LOG` directives when set, otherwise warn (debug with --verbose)
fn log_filter(verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(env_directives.unwrap_or_default())
}

fn init_tracing(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, env_directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let total_start = Instant::now();

    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => match load_config(&args.input) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("no config file loaded: {}", e);
                CosmicConfig::default()
            }
        },
    };

    let measurement = load_measurement(&args.input)?;
    let calculator = CosmicCalculator::new();
    let summary = calculator.system_summary(&measurement)?;

    eprintln!(
        "Measured '{}': {} processes, {} data movements, {} CFP",
        measurement.system.name,
        measurement.process_count(),
        measurement.movement_count(),
        summary.total_cfp
    );

    if args.summary {
        let mut writer = stdout();
        generate_summary(&measurement, &summary, &mut writer)?;
    }

    if !args.no_write {
        // CLI args override config, which overrides defaults
        if let Some(format) = args.format {
            config.output.format = format;
        }
        let options = ExportOptions::from(&config);
        let output = args.output.clone().unwrap_or_else(|| config.output_path());

        export(&measurement, &output, &options)?;
        eprintln!("Report written to: {}", output.display());
    }

    if args.timing {
        eprintln!("Total time: {:.2?}", total_start.elapsed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(false, None).to_string(), "warn");
        assert_eq!(log_filter(true, None).to_string(), "debug");
        assert_eq!(log_filter(false, Some("")).to_string(), "warn");
    }

    #[test]
    fn test_rust_log_overrides_default_level() {
        let filter = log_filter(false, Some("debug")).to_string();
        assert!(filter.contains("debug"));
        assert!(!filter.contains("warn"));

        let filter = log_filter(true, Some("cosmic_cfp=trace")).to_string();
        assert!(filter.contains("cosmic_cfp=trace"));
        assert!(!filter.contains("debug"));
    }
}
