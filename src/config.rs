//! Configuration file support for cosmic-cfp
//!
//! This module handles parsing `.cosmic.toml` configuration files that
//! set default output and report presentation options.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .cosmic.toml
//!
//! [output]
//! # "xlsx" (default) or "json"
//! format = "xlsx"
//!
//! # Where to write the report when no --output is given
//! path = "reports/cosmic_measurement.xlsx"
//!
//! [report]
//! # Joins label lists (actors, storage, objects) in the Summary sheet
//! list_separator = "; "
//!
//! # Header row styling in workbooks
//! bold_headers = true
//!
//! # Size columns to their content in workbooks
//! autofit = true
//! ```
//!
//! Command-line flags override these values.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::ReportOptions;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Excel workbook with one sheet per table
    #[default]
    Xlsx,
    /// JSON document with one array per table
    Json,
}

impl OutputFormat {
    /// Default file name for this format
    pub fn default_path(&self) -> PathBuf {
        match self {
            OutputFormat::Xlsx => PathBuf::from("cosmic_measurement.xlsx"),
            OutputFormat::Json => PathBuf::from("cosmic_measurement.json"),
        }
    }
}

/// Output configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    /// Report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Report path (default depends on the format)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Report presentation section
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Separator for label lists in the Summary table
    #[serde(default = "default_list_separator")]
    pub list_separator: String,

    /// Bold header row in workbooks
    #[serde(default = "default_true")]
    pub bold_headers: bool,

    /// Fit column widths to content in workbooks
    #[serde(default = "default_true")]
    pub autofit: bool,
}

fn default_list_separator() -> String {
    "; ".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            list_separator: default_list_separator(),
            bold_headers: default_true(),
            autofit: default_true(),
        }
    }
}

impl ReportConfig {
    /// Options for the report builder
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            list_separator: self.list_separator.clone(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CosmicConfig {
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Report presentation configuration
    #[serde(default)]
    pub report: ReportConfig,
}

impl CosmicConfig {
    /// Report path, falling back to the format's default name
    pub fn output_path(&self) -> PathBuf {
        self.output
            .path
            .clone()
            .unwrap_or_else(|| self.output.format.default_path())
    }
}

/// Load configuration for a measurement document
///
/// Searches for `.cosmic.toml` in the document's directory and parent
/// directories. A missing file yields the defaults.
pub fn load_config(start_path: &Path) -> Result<CosmicConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(CosmicConfig::default()),
    }
}

/// Load an explicit configuration file
pub fn load_config_file(path: &Path) -> Result<CosmicConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CosmicConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".cosmic.toml", "cosmic.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // Move to parent directory
        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}
