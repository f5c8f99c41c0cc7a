//! Report generation for COSMIC measurements
//!
//! Builds the three logical tables of a measurement report (Summary,
//! Functional Processes, Data Movements) independently of any file format,
//! and renders a short plain-text summary for the terminal.
//!
//! Writing the tables to a workbook or JSON file is the job of
//! [`export`](crate::export).

use std::io::{self, Write};

use serde::Serialize;
use tracing::debug;

use crate::calculator::{CosmicCalculator, InvariantViolation, SystemSummary};
use crate::model::SystemMeasurement;

/// Sheet names, in output order
pub const SUMMARY_SHEET: &str = "Summary";
pub const PROCESS_SHEET: &str = "Functional Processes";
pub const MOVEMENT_SHEET: &str = "Data Movements";

/// A single table cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(usize),
    Empty,
}

impl Cell {
    fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    fn optional(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }
}

/// A fixed-shape record of one of the report tables
pub trait TableRow {
    /// Column headers, in order
    const COLUMNS: &'static [&'static str];

    /// Cell values, one per column
    fn cells(&self) -> Vec<Cell>;
}

/// One metric of the Summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub metric: String,
    pub value: Cell,
}

impl TableRow for SummaryRow {
    const COLUMNS: &'static [&'static str] = &["Metric", "Value"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::text(&self.metric), self.value.clone()]
    }
}

/// One functional process with its CFP breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRow {
    pub name: String,
    pub trigger: String,
    pub object_of_interest: String,
    pub description: Option<String>,
    pub entries: usize,
    pub exits: usize,
    pub reads: usize,
    pub writes: usize,
    pub total_cfp: usize,
}

impl TableRow for ProcessRow {
    const COLUMNS: &'static [&'static str] = &[
        "Functional Process",
        "Trigger",
        "Object of Interest",
        "Description",
        "Entry (E)",
        "Exit (X)",
        "Read (R)",
        "Write (W)",
        "Total CFP",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.name),
            Cell::text(&self.trigger),
            Cell::text(&self.object_of_interest),
            Cell::optional(self.description.as_deref()),
            Cell::Number(self.entries),
            Cell::Number(self.exits),
            Cell::Number(self.reads),
            Cell::Number(self.writes),
            Cell::Number(self.total_cfp),
        ]
    }
}

/// One data movement, flattened with its owning process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementRow {
    pub process: String,
    /// 1-based position within the process
    pub sequence: usize,
    /// Canonical letter code
    pub movement_type: String,
    pub description: String,
    pub object_of_interest: String,
    pub trigger: String,
    pub code_reference: Option<String>,
    pub notes: Option<String>,
}

impl TableRow for MovementRow {
    const COLUMNS: &'static [&'static str] = &[
        "Functional Process",
        "Sequence",
        "Movement Type",
        "Description",
        "Object of Interest",
        "Trigger",
        "Code Reference",
        "Notes",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.process),
            Cell::Number(self.sequence),
            Cell::text(&self.movement_type),
            Cell::text(&self.description),
            Cell::text(&self.object_of_interest),
            Cell::text(&self.trigger),
            Cell::optional(self.code_reference.as_deref()),
            Cell::optional(self.notes.as_deref()),
        ]
    }
}

/// A named table ready for a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn from_rows<R: TableRow>(name: &'static str, rows: &[R]) -> Self {
        Self {
            name,
            columns: R::COLUMNS,
            rows: rows.iter().map(TableRow::cells).collect(),
        }
    }

    /// Rows as (column, cell) records
    pub fn records(&self) -> impl Iterator<Item = Vec<(&'static str, &Cell)>> + '_ {
        self.rows
            .iter()
            .map(|row| self.columns.iter().copied().zip(row.iter()).collect())
    }
}

/// The three report tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTables {
    pub summary_rows: Vec<SummaryRow>,
    pub process_rows: Vec<ProcessRow>,
    pub movement_rows: Vec<MovementRow>,
}

impl ReportTables {
    /// Tables as sheets, in output order
    pub fn sheets(&self) -> Vec<Sheet> {
        vec![
            Sheet::from_rows(SUMMARY_SHEET, &self.summary_rows),
            Sheet::from_rows(PROCESS_SHEET, &self.process_rows),
            Sheet::from_rows(MOVEMENT_SHEET, &self.movement_rows),
        ]
    }
}

/// Presentation options for the report tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Joins label lists in the Summary table
    pub list_separator: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            list_separator: "; ".to_string(),
        }
    }
}

/// Build the report tables with default options
pub fn build(
    measurement: &SystemMeasurement,
    calculator: &CosmicCalculator,
) -> Result<ReportTables, InvariantViolation> {
    build_with_options(measurement, calculator, &ReportOptions::default())
}

/// Build the report tables
pub fn build_with_options(
    measurement: &SystemMeasurement,
    calculator: &CosmicCalculator,
    options: &ReportOptions,
) -> Result<ReportTables, InvariantViolation> {
    let summary = calculator.system_summary(measurement)?;

    let tables = ReportTables {
        summary_rows: summary_rows(measurement, &summary, options),
        process_rows: process_rows(measurement, &summary)?,
        movement_rows: movement_rows(measurement),
    };

    debug!(
        processes = tables.process_rows.len(),
        movements = tables.movement_rows.len(),
        "report tables built"
    );

    Ok(tables)
}

fn summary_rows(
    measurement: &SystemMeasurement,
    summary: &SystemSummary,
    options: &ReportOptions,
) -> Vec<SummaryRow> {
    let list = |labels: &[String]| {
        if labels.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(labels.join(options.list_separator.as_str()))
        }
    };
    let system = &measurement.system;

    [
        ("System", Cell::text(&system.name)),
        ("Boundary", Cell::text(&system.boundary)),
        ("Description", Cell::text(&system.description)),
        ("Persistence Resources", list(system.persistence_resources.as_slice())),
        ("External Actors", list(system.external_actors.as_slice())),
        ("Objects of Interest", list(measurement.objects_of_interest.as_slice())),
        (
            "Functional Processes",
            Cell::Number(measurement.process_count()),
        ),
        ("Data Movements", Cell::Number(measurement.movement_count())),
        ("Total CFP", Cell::Number(summary.total_cfp)),
    ]
    .into_iter()
    .map(|(metric, value)| SummaryRow {
        metric: metric.to_string(),
        value,
    })
    .collect()
}

fn process_rows(
    measurement: &SystemMeasurement,
    summary: &SystemSummary,
) -> Result<Vec<ProcessRow>, InvariantViolation> {
    if summary.per_process.len() != measurement.functional_processes.len() {
        return Err(InvariantViolation(format!(
            "summary covers {} processes but the measurement has {}",
            summary.per_process.len(),
            measurement.functional_processes.len()
        )));
    }

    measurement
        .functional_processes
        .iter()
        .zip(&summary.per_process)
        .map(|(process, counts)| {
            if process.name != counts.name {
                return Err(InvariantViolation(format!(
                    "summary for '{}' found where '{}' was expected",
                    counts.name, process.name
                )));
            }
            Ok(ProcessRow {
                name: process.name.clone(),
                trigger: process.trigger.clone(),
                object_of_interest: process.object_of_interest.clone(),
                description: process.description.clone(),
                entries: counts.entries,
                exits: counts.exits,
                reads: counts.reads,
                writes: counts.writes,
                total_cfp: counts.total_cfp,
            })
        })
        .collect()
}

fn movement_rows(measurement: &SystemMeasurement) -> Vec<MovementRow> {
    measurement
        .functional_processes
        .iter()
        .flat_map(|process| {
            process
                .data_movements
                .iter()
                .enumerate()
                .map(move |(index, movement)| MovementRow {
                    process: process.name.clone(),
                    sequence: index + 1,
                    movement_type: movement.movement_type.code().to_string(),
                    description: movement.description.clone(),
                    object_of_interest: movement.object_of_interest.clone(),
                    trigger: movement.trigger.clone(),
                    code_reference: movement.code_reference.clone(),
                    notes: movement.notes.clone(),
                })
        })
        .collect()
}

/// Generate a plain-text summary to the given writer
pub fn generate_summary<W: Write>(
    measurement: &SystemMeasurement,
    summary: &SystemSummary,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "COSMIC Measurement: {}", measurement.system.name)?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer, "Boundary: {}", measurement.system.boundary)?;
    writeln!(
        writer,
        "Total CFP: {} | Processes: {} | Data Movements: {}",
        summary.total_cfp,
        measurement.process_count(),
        measurement.movement_count()
    )?;

    if summary.per_process.is_empty() {
        return Ok(());
    }

    let width = summary
        .per_process
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Functional Process".len());

    writeln!(writer)?;
    writeln!(
        writer,
        "  {:<width$}  {:>3} {:>3} {:>3} {:>3}  {:>5}",
        "Functional Process",
        "E",
        "X",
        "R",
        "W",
        "CFP",
        width = width
    )?;
    for s in &summary.per_process {
        writeln!(
            writer,
            "  {:<width$}  {:>3} {:>3} {:>3} {:>3}  {:>5}",
            s.name,
            s.entries,
            s.exits,
            s.reads,
            s.writes,
            s.total_cfp,
            width = width
        )?;
    }

    Ok(())
}
