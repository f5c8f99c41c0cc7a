//! Report export
//!
//! Sinks accept the report tables as named sheets and persist them in one
//! step. Tables are always fully built before a sink is touched, so a
//! failing measurement never leaves a partial report behind.

use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::calculator::{CosmicCalculator, InvariantViolation};
use crate::config::{CosmicConfig, OutputFormat};
use crate::model::SystemMeasurement;
use crate::report::{Cell, ReportOptions, ReportTables, Sheet, build_with_options};

/// Errors that can occur while exporting a report
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sheet '{0}' has too many rows or columns for a workbook")]
    SheetTooLarge(&'static str),

    #[error(
        "Sheet '{sheet}', column '{column}', row {row}: text of {length} characters exceeds the workbook cell limit of {MAX_CELL_CHARS}"
    )]
    CellTooLong {
        sheet: &'static str,
        column: &'static str,
        row: usize,
        length: usize,
    },
}

/// Longest text a workbook cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Destination for report sheets
pub trait ReportSink {
    /// Append a sheet; sheets keep the order they are written in
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), ExportError>;

    /// Persist all written sheets to `path`
    fn save(&mut self, path: &Path) -> Result<(), ExportError>;
}

/// Export options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: OutputFormat,
    pub report: ReportOptions,
    pub bold_headers: bool,
    pub autofit: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&CosmicConfig::default())
    }
}

impl From<&CosmicConfig> for ExportOptions {
    fn from(config: &CosmicConfig) -> Self {
        Self {
            format: config.output.format,
            report: config.report.report_options(),
            bold_headers: config.report.bold_headers,
            autofit: config.report.autofit,
        }
    }
}

/// Workbook sink with one worksheet per sheet
pub struct XlsxSink {
    workbook: Workbook,
    header_format: Format,
    autofit: bool,
}

impl XlsxSink {
    pub fn new(bold_headers: bool, autofit: bool) -> Self {
        let header_format = if bold_headers {
            Format::new().set_bold()
        } else {
            Format::new()
        };
        Self {
            workbook: Workbook::new(),
            header_format,
            autofit,
        }
    }

    /// Workbook bytes, for callers that handle the write themselves
    pub fn to_buffer(&mut self) -> Result<Vec<u8>, ExportError> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

impl ReportSink for XlsxSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), ExportError> {
        let too_large = || ExportError::SheetTooLarge(sheet.name);

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, header) in sheet.columns.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| too_large())?;
            worksheet.write_string_with_format(0, col, *header, &self.header_format)?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = u32::try_from(index + 1).map_err(|_| too_large())?;
            for (col, cell) in row.iter().enumerate() {
                let col = u16::try_from(col).map_err(|_| too_large())?;
                match cell {
                    Cell::Text(text) => {
                        let length = text.chars().count();
                        if length > MAX_CELL_CHARS {
                            // row is 1-based and counts the header
                            return Err(ExportError::CellTooLong {
                                sheet: sheet.name,
                                column: sheet.columns.get(usize::from(col)).copied().unwrap_or(""),
                                row: index + 2,
                                length,
                            });
                        }
                        worksheet.write_string(row_num, col, text)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row_num, col, *n as f64)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        if self.autofit {
            worksheet.autofit();
        }

        debug!(sheet = sheet.name, rows = sheet.rows.len(), "worksheet written");
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), ExportError> {
        self.workbook.save(path)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct JsonSheet {
    name: &'static str,
    columns: &'static [&'static str],
    rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Serialize)]
struct JsonReport {
    sheets: Vec<JsonSheet>,
}

/// JSON sink: `{"sheets": [{"name", "columns", "rows"}]}`
#[derive(Debug, Default)]
pub struct JsonSink {
    sheets: Vec<JsonSheet>,
}

impl JsonSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON of the written sheets
    pub fn to_string_pretty(&self) -> Result<String, ExportError> {
        let report = JsonReport {
            sheets: self
                .sheets
                .iter()
                .map(|s| JsonSheet {
                    name: s.name,
                    columns: s.columns,
                    rows: s.rows.clone(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl ReportSink for JsonSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), ExportError> {
        self.sheets.push(JsonSheet {
            name: sheet.name,
            columns: sheet.columns,
            rows: sheet.rows.clone(),
        });
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, self.to_string_pretty()?)?;
        Ok(())
    }
}

/// Sink for an output format
pub fn sink_for(options: &ExportOptions) -> Box<dyn ReportSink> {
    match options.format {
        OutputFormat::Xlsx => Box::new(XlsxSink::new(options.bold_headers, options.autofit)),
        OutputFormat::Json => Box::new(JsonSink::new()),
    }
}

/// Write every table of a report to a sink, in sheet order
pub fn write_tables(tables: &ReportTables, sink: &mut dyn ReportSink) -> Result<(), ExportError> {
    for sheet in tables.sheets() {
        sink.write_sheet(&sheet)?;
    }
    Ok(())
}

/// Build the report for a measurement and save it to `path`
pub fn export(
    measurement: &SystemMeasurement,
    path: &Path,
    options: &ExportOptions,
) -> Result<ReportTables, ExportError> {
    let tables = build_with_options(measurement, &CosmicCalculator::new(), &options.report)?;

    let mut sink = sink_for(options);
    write_tables(&tables, sink.as_mut())?;
    sink.save(path)?;

    info!(path = %path.display(), format = ?options.format, "report saved");
    Ok(tables)
}
