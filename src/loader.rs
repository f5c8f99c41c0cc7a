//! Measurement loading and validation
//!
//! Converts a parsed document tree (YAML or JSON, both represented as a
//! [`serde_json::Value`]) into a [`SystemMeasurement`] in a single pass.
//! Untyped data never leaves this module: every field is either validated
//! into the model, defaulted, or rejected with a [`LoadError`].
//!
//! Expected document shape:
//!
//! ```yaml
//! system:
//!   name: Order Service
//!   boundary: REST API of the order service
//!   description: Handles customer orders
//!   persistence_resources: [Orders DB]
//!   external_actors: [Customer]
//! objects_of_interest: [Order]
//! functional_processes:
//!   - name: Submit Order
//!     trigger: Customer submits an order
//!     object_of_interest: Order
//!     data_movements:
//!       - type: E
//!         description: Order details
//!       - type: Write
//!         description: Persist order
//!         code_reference: src/orders.rs:42
//! ```
//!
//! Unknown keys are ignored.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{DataMovement, FunctionalProcess, MovementType, SystemInfo, SystemMeasurement};

/// A parsed, not yet validated, measurement document
pub type Document = Value;

/// Errors that can occur while loading a measurement
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Missing required field '{path}'")]
    MissingField { path: String },

    #[error(
        "Invalid data movement type '{value}' at '{location}' (expected E, X, R, W or Entry, Exit, Read, Write)"
    )]
    InvalidMovementType { value: String, location: String },

    #[error("Duplicate functional process name '{name}' at '{location}'")]
    DuplicateProcessName { name: String, location: String },

    #[error("Failed to read measurement file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported document format '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}

/// Structured-text format of an input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse raw text into a document tree
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Document, LoadError> {
    let document = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(document)
}

/// Parse and validate a measurement from raw text
pub fn load_str(content: &str, format: DocumentFormat) -> Result<SystemMeasurement, LoadError> {
    let document = parse_document(content, format)?;
    load(&document)
}

/// Read, parse and validate a measurement file
///
/// The format is chosen from the file extension.
pub fn load_measurement(path: &Path) -> Result<SystemMeasurement, LoadError> {
    let format = DocumentFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "reading measurement document");
    let content = fs::read_to_string(path)?;
    load_str(&content, format)
}

/// Validate a parsed document into a [`SystemMeasurement`]
pub fn load(document: &Document) -> Result<SystemMeasurement, LoadError> {
    let root = document.as_object().ok_or_else(|| {
        LoadError::MalformedDocument(
            "top level must be a mapping with 'system' and 'functional_processes' keys"
                .to_string(),
        )
    })?;

    let system = load_system(root)?;
    let objects_of_interest = labels(
        root,
        &["objects_of_interest", "objects"],
        "objects_of_interest",
    )?;

    let mut seen = HashSet::new();
    let mut functional_processes = Vec::new();
    for (index, item) in sequence(root, &["functional_processes"], "functional_processes")?
        .iter()
        .enumerate()
    {
        let path = format!("functional_processes[{}]", index);
        let process = load_process(item, &path)?;
        if !seen.insert(process.name.clone()) {
            return Err(LoadError::DuplicateProcessName {
                name: process.name,
                location: format!("{}.name", path),
            });
        }
        functional_processes.push(process);
    }

    let measurement = SystemMeasurement {
        system,
        objects_of_interest,
        functional_processes,
    };

    info!(
        system = %measurement.system.name,
        processes = measurement.process_count(),
        movements = measurement.movement_count(),
        "measurement loaded"
    );

    Ok(measurement)
}

fn load_system(root: &Map<String, Value>) -> Result<SystemInfo, LoadError> {
    let empty = Map::new();
    let system = match root.get("system") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(LoadError::MalformedDocument(
                "'system' must be a mapping".to_string(),
            ));
        }
    };

    Ok(SystemInfo {
        name: required_text(system, &["name"], "system.name")?,
        boundary: required_text(system, &["boundary"], "system.boundary")?,
        description: required_text(system, &["description"], "system.description")?,
        persistence_resources: labels(
            system,
            &["persistence_resources"],
            "system.persistence_resources",
        )?,
        external_actors: labels(system, &["external_actors"], "system.external_actors")?,
    })
}

fn load_process(value: &Value, path: &str) -> Result<FunctionalProcess, LoadError> {
    let map = mapping(value, path)?;

    let name = required_text(map, &["name"], &format!("{}.name", path))?;
    let trigger = required_text(map, &["trigger"], &format!("{}.trigger", path))?;
    let object_of_interest = required_text(
        map,
        &["object_of_interest", "ooi"],
        &format!("{}.object_of_interest", path),
    )?;
    let description = optional_text(
        map,
        &["description", "purpose"],
        &format!("{}.description", path),
    )?;

    let movements_path = format!("{}.data_movements", path);
    let data_movements = sequence(map, &["data_movements"], &movements_path)?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            load_movement(
                item,
                &format!("{}[{}]", movements_path, index),
                &object_of_interest,
                &trigger,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FunctionalProcess {
        name,
        trigger,
        object_of_interest,
        description,
        data_movements,
    })
}

fn load_movement(
    value: &Value,
    path: &str,
    process_object: &str,
    process_trigger: &str,
) -> Result<DataMovement, LoadError> {
    let map = mapping(value, path)?;

    let type_path = format!("{}.type", path);
    let raw_type = required_text(map, &["type"], &type_path)?;
    let movement_type =
        MovementType::parse(&raw_type).ok_or_else(|| LoadError::InvalidMovementType {
            value: raw_type.clone(),
            location: type_path,
        })?;

    Ok(DataMovement {
        movement_type,
        description: required_text(map, &["description"], &format!("{}.description", path))?,
        object_of_interest: optional_text(
            map,
            &["object_of_interest", "ooi"],
            &format!("{}.object_of_interest", path),
        )?
        .unwrap_or_else(|| process_object.to_string()),
        trigger: optional_text(map, &["trigger"], &format!("{}.trigger", path))?
            .unwrap_or_else(|| process_trigger.to_string()),
        code_reference: optional_text(
            map,
            &["code_reference"],
            &format!("{}.code_reference", path),
        )?,
        notes: optional_text(
            map,
            &["notes", "additional_notes"],
            &format!("{}.notes", path),
        )?,
    })
}

/// First non-null value among `keys`, canonical name first
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

fn mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, LoadError> {
    value
        .as_object()
        .ok_or_else(|| LoadError::MalformedDocument(format!("'{}' must be a mapping", path)))
}

fn sequence<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
    path: &str,
) -> Result<&'a [Value], LoadError> {
    match lookup(map, keys) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(LoadError::MalformedDocument(format!(
            "'{}' must be a sequence",
            path
        ))),
    }
}

/// Textual form of a scalar; blank strings count as absent
fn scalar_text(value: &Value, path: &str) -> Result<Option<String>, LoadError> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(LoadError::MalformedDocument(format!(
                "'{}' must be a text value",
                path
            )));
        }
    };
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn optional_text(
    map: &Map<String, Value>,
    keys: &[&str],
    path: &str,
) -> Result<Option<String>, LoadError> {
    match lookup(map, keys) {
        Some(value) => scalar_text(value, path),
        None => Ok(None),
    }
}

fn required_text(map: &Map<String, Value>, keys: &[&str], path: &str) -> Result<String, LoadError> {
    optional_text(map, keys, path)?.ok_or_else(|| LoadError::MissingField {
        path: path.to_string(),
    })
}

/// Documentary label list; items may be scalars or mappings with a `name`
fn labels(map: &Map<String, Value>, keys: &[&str], path: &str) -> Result<Vec<String>, LoadError> {
    let mut result = Vec::new();
    for (index, item) in sequence(map, keys, path)?.iter().enumerate() {
        let item_path = format!("{}[{}]", path, index);
        let label = match item {
            Value::Object(entry) => optional_text(entry, &["name"], &format!("{}.name", item_path))?,
            other => scalar_text(other, &item_path)?,
        };
        match label {
            Some(label) => result.push(label),
            None => {
                return Err(LoadError::MalformedDocument(format!(
                    "'{}' must be a non-empty label",
                    item_path
                )));
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ORDER_SERVICE: &str = r#"
system:
  name: Order Service
  boundary: REST API
  description: Handles customer orders
  persistence_resources: [Orders DB]
  external_actors:
    - Customer
    - Payment Provider
objects_of_interest: [Order, Customer]
functional_processes:
  - name: Submit Order
    trigger: Customer submits an order
    object_of_interest: Order
    description: Accepts a new order
    data_movements:
      - type: E
        description: Order details
      - type: read
        description: Customer record
        object_of_interest: Customer
      - type: Write
        description: Persist order
        code_reference: src/orders.rs:42
      - type: x
        description: Confirmation
        notes: sent by email
  - name: Cancel Order
    trigger: Customer cancels
    ooi: Order
    purpose: Cancels an open order
    data_movements: []
"#;

    fn load_yaml(content: &str) -> Result<SystemMeasurement, LoadError> {
        load_str(content, DocumentFormat::Yaml)
    }

    #[test]
    fn test_load_order_service() {
        let measurement = load_yaml(ORDER_SERVICE).unwrap();

        assert_eq!(measurement.system.name, "Order Service");
        assert_eq!(measurement.system.persistence_resources, vec!["Orders DB"]);
        assert_eq!(
            measurement.system.external_actors,
            vec!["Customer", "Payment Provider"]
        );
        assert_eq!(measurement.objects_of_interest, vec!["Order", "Customer"]);

        let names: Vec<_> = measurement
            .functional_processes
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Submit Order", "Cancel Order"]);

        let submit = &measurement.functional_processes[0];
        let kinds: Vec<_> = submit.data_movements.iter().map(|m| m.movement_type).collect();
        assert_eq!(
            kinds,
            vec![
                MovementType::Entry,
                MovementType::Read,
                MovementType::Write,
                MovementType::Exit
            ]
        );
        assert_eq!(
            submit.data_movements[2].code_reference.as_deref(),
            Some("src/orders.rs:42")
        );
        assert_eq!(submit.data_movements[3].notes.as_deref(), Some("sent by email"));
    }

    #[test]
    fn test_movement_inherits_object_and_trigger() {
        let measurement = load_yaml(ORDER_SERVICE).unwrap();
        let submit = &measurement.functional_processes[0];

        assert_eq!(submit.data_movements[0].object_of_interest, "Order");
        assert_eq!(submit.data_movements[1].object_of_interest, "Customer");
        assert_eq!(
            submit.data_movements[0].trigger,
            "Customer submits an order"
        );
    }

    #[test]
    fn test_aliases() {
        let measurement = load_yaml(ORDER_SERVICE).unwrap();
        let cancel = &measurement.functional_processes[1];

        assert_eq!(cancel.object_of_interest, "Order");
        assert_eq!(cancel.description.as_deref(), Some("Cancels an open order"));
        assert!(cancel.data_movements.is_empty());
    }

    #[test]
    fn test_missing_system_field() {
        let err = load_yaml(
            r#"
system:
  name: Order Service
  description: no boundary
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MissingField { path } => assert_eq!(path, "system.boundary"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_movement_description() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: O
    data_movements:
      - type: E
        description: ok
      - type: R
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MissingField { path } => {
                assert_eq!(path, "functional_processes[0].data_movements[1].description")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let err = load_yaml(
            r#"
system: {name: "  ", boundary: B, description: D}
"#,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::MissingField { ref path } if path == "system.name"));
    }

    #[test]
    fn test_invalid_movement_type() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: O
    data_movements:
      - type: Delete
        description: remove
"#,
        )
        .unwrap_err();

        match err {
            LoadError::InvalidMovementType { value, location } => {
                assert_eq!(value, "Delete");
                assert_eq!(location, "functional_processes[0].data_movements[0].type");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_duplicate_process_name() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - {name: P, trigger: T, object_of_interest: O}
  - {name: Q, trigger: T, object_of_interest: O}
  - {name: P, trigger: T2, object_of_interest: O2}
"#,
        )
        .unwrap_err();

        match err {
            LoadError::DuplicateProcessName { name, location } => {
                assert_eq!(name, "P");
                assert_eq!(location, "functional_processes[2].name");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            load_yaml("- just\n- a list\n"),
            Err(LoadError::MalformedDocument(_))
        ));
        assert!(matches!(
            load_yaml(
                "system: {name: S, boundary: B, description: D}\nfunctional_processes: nope\n"
            ),
            Err(LoadError::MalformedDocument(_))
        ));
        assert!(matches!(
            load_yaml("system: [a, b]\n"),
            Err(LoadError::MalformedDocument(_))
        ));
        assert!(matches!(
            load_yaml("system: {name: [x], boundary: B, description: D}\n"),
            Err(LoadError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let measurement = load_yaml(
            r#"
version: 3
system: {name: S, boundary: B, description: D, owner: team}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: O
    priority: high
    data_movements:
      - {type: W, description: store, weight: 2}
"#,
        )
        .unwrap();

        assert_eq!(measurement.movement_count(), 1);
    }

    #[test]
    fn test_scalar_coercion() {
        let measurement = load_yaml(
            r#"
system: {name: 2024, boundary: true, description: D}
"#,
        )
        .unwrap();

        assert_eq!(measurement.system.name, "2024");
        assert_eq!(measurement.system.boundary, "true");
        assert!(measurement.functional_processes.is_empty());
    }

    #[test]
    fn test_load_json() {
        let measurement = load_str(
            r#"{
                "system": {"name": "S", "boundary": "B", "description": "D"},
                "objects": ["Order"],
                "functional_processes": [
                    {"name": "P", "trigger": "T", "object_of_interest": "O",
                     "data_movements": [{"type": "Entry", "description": "in"}]}
                ]
            }"#,
            DocumentFormat::Json,
        )
        .unwrap();

        assert_eq!(measurement.objects_of_interest, vec!["Order"]);
        assert_eq!(
            measurement.functional_processes[0].data_movements[0].movement_type,
            MovementType::Entry
        );
    }

    #[test]
    fn test_document_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("m.json")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("m.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert!(matches!(
            DocumentFormat::from_path(&PathBuf::from("m.txt")),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_is_idempotent() {
        let first = load_yaml(ORDER_SERVICE).unwrap();
        let second = load_yaml(ORDER_SERVICE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_process_trigger() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    object_of_interest: O
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MissingField { path } => assert_eq!(path, "functional_processes[0].trigger"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_process_object_of_interest() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - {name: P, trigger: T, object_of_interest: O}
  - {name: Q, trigger: T}
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MissingField { path } => {
                assert_eq!(path, "functional_processes[1].object_of_interest")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_movement_type() {
        let err = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: O
    data_movements:
      - description: no kind given
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MissingField { path } => {
                assert_eq!(path, "functional_processes[0].data_movements[0].type")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let measurement = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: Order
    ooi: Basket
    description: canonical
    purpose: alias
    data_movements:
      - type: R
        description: Customer record
        object_of_interest: Customer
        ooi: Account
        notes: canonical note
        additional_notes: alias note
"#,
        )
        .unwrap();

        let process = &measurement.functional_processes[0];
        assert_eq!(process.object_of_interest, "Order");
        assert_eq!(process.description.as_deref(), Some("canonical"));

        let movement = &process.data_movements[0];
        assert_eq!(movement.object_of_interest, "Customer");
        assert_eq!(movement.notes.as_deref(), Some("canonical note"));
    }

    #[test]
    fn test_alias_used_when_canonical_is_null() {
        let measurement = load_yaml(
            r#"
system: {name: S, boundary: B, description: D}
functional_processes:
  - name: P
    trigger: T
    object_of_interest: ~
    ooi: Basket
    data_movements:
      - {type: E, description: d, notes: null, additional_notes: alias note}
"#,
        )
        .unwrap();

        let process = &measurement.functional_processes[0];
        assert_eq!(process.object_of_interest, "Basket");
        assert_eq!(process.data_movements[0].notes.as_deref(), Some("alias note"));
    }

    #[test]
    fn test_label_mapping_without_name() {
        let err = load_yaml(
            r#"
system:
  name: S
  boundary: B
  description: D
  external_actors:
    - Customer
    - {role: payment}
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MalformedDocument(message) => {
                assert!(message.contains("'system.external_actors[1]'"), "{}", message)
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_null_persistence_resource() {
        let err = load_yaml(
            r#"
system:
  name: S
  boundary: B
  description: D
  persistence_resources: [Orders DB, ~]
"#,
        )
        .unwrap_err();

        match err {
            LoadError::MalformedDocument(message) => {
                assert!(message.contains("'system.persistence_resources[1]'"), "{}", message)
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
