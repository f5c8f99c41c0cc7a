//! COSMIC Function Point calculation
//!
//! The COSMIC rule is simple: every data movement counts as one CFP,
//! whatever its kind. A process's size is the number of its movements and
//! the system size is the sum over all processes.
//!
//! The calculator is a pure function of an already validated
//! [`SystemMeasurement`]; it performs no I/O and keeps no state.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{FunctionalProcess, MovementType, SystemMeasurement};

/// Internal defect: a measurement broke a guarantee the loader provides
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invariant violation: {0}")]
pub struct InvariantViolation(pub String);

/// Tally of data movements by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovementCounts {
    pub entries: usize,
    pub exits: usize,
    pub reads: usize,
    pub writes: usize,
}

impl MovementCounts {
    /// Count one more movement of `kind`
    pub fn record(&mut self, kind: MovementType) {
        match kind {
            MovementType::Entry => self.entries += 1,
            MovementType::Exit => self.exits += 1,
            MovementType::Read => self.reads += 1,
            MovementType::Write => self.writes += 1,
        }
    }

    /// 1 CFP per movement
    pub fn total_cfp(&self) -> usize {
        self.entries + self.exits + self.reads + self.writes
    }
}

/// CFP summary of one functional process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Name of the summarized process
    pub name: String,
    pub entries: usize,
    pub exits: usize,
    pub reads: usize,
    pub writes: usize,
    /// entries + exits + reads + writes
    pub total_cfp: usize,
}

impl ProcessSummary {
    fn from_counts(name: &str, counts: MovementCounts) -> Self {
        Self {
            name: name.to_string(),
            entries: counts.entries,
            exits: counts.exits,
            reads: counts.reads,
            writes: counts.writes,
            total_cfp: counts.total_cfp(),
        }
    }
}

/// CFP summary of a whole measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    /// Sum of every process's CFP
    pub total_cfp: usize,
    /// One entry per process, in measurement order
    pub per_process: Vec<ProcessSummary>,
}

impl SystemSummary {
    /// Summary of the named process
    pub fn process(&self, name: &str) -> Option<&ProcessSummary> {
        self.per_process.iter().find(|s| s.name == name)
    }
}

/// Computes COSMIC Function Points
#[derive(Debug, Clone, Copy, Default)]
pub struct CosmicCalculator;

impl CosmicCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Movement counts and CFP for a single process
    ///
    /// A process without movements is valid and yields zero everywhere.
    pub fn process_summary(&self, process: &FunctionalProcess) -> ProcessSummary {
        let mut counts = MovementCounts::default();
        for movement in &process.data_movements {
            counts.record(movement.movement_type);
        }
        ProcessSummary::from_counts(&process.name, counts)
    }

    /// Per-process summaries and the system total
    ///
    /// Fails only when process names are not unique, which the loader
    /// rules out; a hand-built measurement can still trip it.
    pub fn system_summary(
        &self,
        measurement: &SystemMeasurement,
    ) -> Result<SystemSummary, InvariantViolation> {
        let mut seen = HashSet::new();
        let mut per_process = Vec::with_capacity(measurement.functional_processes.len());

        for process in &measurement.functional_processes {
            if !seen.insert(process.name.as_str()) {
                return Err(InvariantViolation(format!(
                    "functional process name '{}' is not unique",
                    process.name
                )));
            }
            per_process.push(self.process_summary(process));
        }

        let total_cfp: usize = per_process.iter().map(|s| s.total_cfp).sum();
        debug!(
            total_cfp,
            processes = per_process.len(),
            "system summary computed"
        );

        Ok(SystemSummary {
            total_cfp,
            per_process,
        })
    }

    /// System total CFP
    pub fn total_cfp(&self, measurement: &SystemMeasurement) -> Result<usize, InvariantViolation> {
        Ok(self.system_summary(measurement)?.total_cfp)
    }
}
