//! # cosmic-cfp - COSMIC Functional Size Measurement
//!
//! Measures software functional size with the COSMIC method: every data
//! movement (Entry, Exit, Read, Write) of a functional process counts as
//! one COSMIC Function Point (CFP).
//!
//! ## Pipeline
//!
//! 1. **Load** - a YAML or JSON document is validated into a
//!    [`SystemMeasurement`] ([`loader`])
//! 2. **Calculate** - per-process and system CFP ([`calculator`])
//! 3. **Report** - Summary, Functional Processes and Data Movements tables
//!    ([`report`])
//! 4. **Export** - tables written as an xlsx workbook or JSON ([`export`])
//!
//! ## Usage
//!
//! ```bash
//! # Write cosmic_measurement.xlsx
//! cosmic-cfp measurement.yaml
//!
//! # Print a summary and write JSON instead
//! cosmic-cfp --summary --format json -o report.json measurement.yaml
//! ```
//!
//! ## Library
//!
//! ```no_run
//! use std::path::Path;
//! use cosmic_cfp::{CosmicCalculator, build, load_measurement};
//!
//! let measurement = load_measurement(Path::new("measurement.yaml"))?;
//! let summary = CosmicCalculator::new().system_summary(&measurement)?;
//! println!("Total CFP: {}", summary.total_cfp);
//!
//! let tables = build(&measurement, &CosmicCalculator::new())?;
//! assert_eq!(tables.process_rows.len(), measurement.process_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod calculator;
pub mod config;
pub mod export;
pub mod loader;
pub mod model;
pub mod report;

pub use calculator::{
    CosmicCalculator, InvariantViolation, MovementCounts, ProcessSummary, SystemSummary,
};
pub use config::{
    ConfigError, CosmicConfig, OutputConfig, OutputFormat, ReportConfig, load_config,
    load_config_file,
};
pub use export::{
    ExportError, ExportOptions, JsonSink, MAX_CELL_CHARS, ReportSink, XlsxSink, export, sink_for,
    write_tables,
};
pub use loader::{
    Document, DocumentFormat, LoadError, load, load_measurement, load_str, parse_document,
};
pub use model::{
    DataMovement, FunctionalProcess, MovementType, SystemInfo, SystemMeasurement,
    UnknownMovementType,
};
pub use report::{
    Cell, MOVEMENT_SHEET, MovementRow, PROCESS_SHEET, ProcessRow, ReportOptions, ReportTables,
    SUMMARY_SHEET, Sheet, SummaryRow, TableRow, build, build_with_options, generate_summary,
};
