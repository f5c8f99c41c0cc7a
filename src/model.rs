//! COSMIC measurement data structures
//!
//! This module defines the entities a measurement is made of: data
//! movements, the functional processes that own them, and the system
//! measurement that owns the processes.
//!
//! Values are built once by the [loader](crate::loader) and read-only
//! afterwards. Inherited fields (object of interest, trigger) are already
//! resolved on every [`DataMovement`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Kind of a COSMIC data movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MovementType {
    /// Data entering the software from a functional user
    Entry,
    /// Data leaving the software towards a functional user
    Exit,
    /// Data fetched from persistent storage
    Read,
    /// Data moved to persistent storage
    Write,
}

impl MovementType {
    /// All kinds, in report column order
    pub const ALL: [MovementType; 4] = [
        MovementType::Entry,
        MovementType::Exit,
        MovementType::Read,
        MovementType::Write,
    ];

    /// Canonical single-letter code (E/X/R/W)
    pub fn code(&self) -> &'static str {
        match self {
            MovementType::Entry => "E",
            MovementType::Exit => "X",
            MovementType::Read => "R",
            MovementType::Write => "W",
        }
    }

    /// Full name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            MovementType::Entry => "Entry",
            MovementType::Exit => "Exit",
            MovementType::Read => "Read",
            MovementType::Write => "Write",
        }
    }

    /// Parse a movement code
    ///
    /// Accepts the letter or the full word, ignoring case and surrounding
    /// whitespace. Anything else yields `None`; there is no fallback kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "E" | "ENTRY" => Some(MovementType::Entry),
            "X" | "EXIT" => Some(MovementType::Exit),
            "R" | "READ" => Some(MovementType::Read),
            "W" | "WRITE" => Some(MovementType::Write),
            _ => None,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a string is not a movement code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported data movement type '{0}', expected one of E, X, R, W")]
pub struct UnknownMovementType(pub String);

impl FromStr for MovementType {
    type Err = UnknownMovementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementType::parse(s).ok_or_else(|| UnknownMovementType(s.to_string()))
    }
}

/// A single recorded Entry, Exit, Read or Write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataMovement {
    /// Kind of movement
    pub movement_type: MovementType,
    /// What is moved and why
    pub description: String,
    /// Object of interest, inherited from the owning process when not declared
    pub object_of_interest: String,
    /// Triggering event, inherited from the owning process when not declared
    pub trigger: String,
    /// Pointer into the code base, purely informational
    pub code_reference: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// A functional process and its ordered data movements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionalProcess {
    /// Process name, unique within a measurement
    pub name: String,
    /// Event that starts the process
    pub trigger: String,
    /// Default object of interest for the movements
    pub object_of_interest: String,
    /// Optional description
    pub description: Option<String>,
    /// Movements in document order
    pub data_movements: Vec<DataMovement>,
}

impl FunctionalProcess {
    /// Number of movements of the given kind
    pub fn count_movements(&self, movement_type: MovementType) -> usize {
        self.data_movements
            .iter()
            .filter(|m| m.movement_type == movement_type)
            .count()
    }
}

/// Whole-system metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub name: String,
    pub boundary: String,
    pub description: String,
    /// Storage systems the software reads from or writes to
    pub persistence_resources: Vec<String>,
    /// Functional users outside the boundary
    pub external_actors: Vec<String>,
}

/// A complete measurement: system metadata plus functional processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemMeasurement {
    pub system: SystemInfo,
    /// Objects declared at system scope (documentation only)
    pub objects_of_interest: Vec<String>,
    /// Processes in document order
    pub functional_processes: Vec<FunctionalProcess>,
}

impl SystemMeasurement {
    /// Look up a process by name
    pub fn process(&self, name: &str) -> Option<&FunctionalProcess> {
        self.functional_processes.iter().find(|p| p.name == name)
    }

    /// Number of functional processes
    pub fn process_count(&self) -> usize {
        self.functional_processes.len()
    }

    /// Number of data movements across all processes
    pub fn movement_count(&self) -> usize {
        self.functional_processes
            .iter()
            .map(|p| p.data_movements.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(movement_type: MovementType) -> DataMovement {
        DataMovement {
            movement_type,
            description: "moves data".to_string(),
            object_of_interest: "Order".to_string(),
            trigger: "Customer submits".to_string(),
            code_reference: None,
            notes: None,
        }
    }

    #[test]
    fn test_parse_letters_and_words() {
        assert_eq!(MovementType::parse("E"), Some(MovementType::Entry));
        assert_eq!(MovementType::parse("x"), Some(MovementType::Exit));
        assert_eq!(MovementType::parse(" read "), Some(MovementType::Read));
        assert_eq!(MovementType::parse("WrItE"), Some(MovementType::Write));
        assert_eq!(MovementType::parse("entry"), Some(MovementType::Entry));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(MovementType::parse("Delete"), None);
        assert_eq!(MovementType::parse(""), None);
        assert_eq!(MovementType::parse("EX"), None);

        let err = "Delete".parse::<MovementType>().unwrap_err();
        assert_eq!(err, UnknownMovementType("Delete".to_string()));
        assert!(err.to_string().contains("'Delete'"));
    }

    #[test]
    fn test_code_round_trips_through_parse() {
        for kind in MovementType::ALL {
            assert_eq!(MovementType::parse(kind.code()), Some(kind));
            assert_eq!(MovementType::parse(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_count_movements() {
        let process = FunctionalProcess {
            name: "Submit Order".to_string(),
            trigger: "Customer submits".to_string(),
            object_of_interest: "Order".to_string(),
            description: None,
            data_movements: vec![
                movement(MovementType::Entry),
                movement(MovementType::Read),
                movement(MovementType::Read),
            ],
        };

        assert_eq!(process.count_movements(MovementType::Entry), 1);
        assert_eq!(process.count_movements(MovementType::Read), 2);
        assert_eq!(process.count_movements(MovementType::Write), 0);
    }
}
