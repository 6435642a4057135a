//! Data structures exchanged between the remote service, the orchestrator
//! and destinations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field type as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Record identifier
    Id,
    /// Free text, picklists, emails, urls
    String,
    /// True/false flag
    Boolean,
    /// Whole number
    Integer,
    /// Floating point, currency, percent
    Double,
    /// Calendar date
    Date,
    /// Timestamp
    DateTime,
    /// Identifier of a record in another table
    Reference,
    /// Any type the destination has no special handling for
    #[serde(untagged)]
    Other(String),
}

/// A single field of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescription {
    /// Creates a new field description.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Structure of a remote table, used by the schema phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Table name
    pub name: String,
    /// Fields in service order
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

impl TableDescription {
    /// Creates a description with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder method to append a field.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescription::new(name, field_type));
        self
    }
}

/// One row of a remote table, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Gets a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterates over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Field names in key order.
    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Approximate in-memory size in bytes, used against the row buffer
    /// budget.
    ///
    /// Counts key bytes plus a per-value estimate: string bytes, 8 bytes for
    /// numbers, 1 for booleans and nulls, recursive sums for nested values.
    pub fn estimated_size(&self) -> usize {
        self.0
            .iter()
            .map(|(key, value)| key.len().saturating_add(value_size(value)))
            .fold(0usize, usize::saturating_add)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_size(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 1,
        Value::Number(_) => 8,
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(value_size).fold(0, usize::saturating_add),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| k.len().saturating_add(value_size(v)))
            .fold(0, usize::saturating_add),
    }
}

/// Result of copying one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum TransferStatus {
    /// All records were written
    Copied,
    /// Copy stopped with the given message
    Failed(String),
}

/// Per-table outcome of the data phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOutcome {
    /// Table name
    pub table: String,
    /// Rows written to the destination
    pub rows: u64,
    /// Number of flushes issued
    pub batches: u64,
    /// Final status
    pub status: TransferStatus,
}

impl TableOutcome {
    /// Whether the table was copied completely.
    pub fn is_copied(&self) -> bool {
        self.status == TransferStatus::Copied
    }
}

/// Summary of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When authentication started
    pub started_at: DateTime<Utc>,
    /// When the data phase ended
    pub finished_at: Option<DateTime<Utc>>,
    /// Tables whose schema was created, in order
    pub schema_tables: Vec<String>,
    /// Data phase outcomes, in processing order
    pub tables: Vec<TableOutcome>,
}

impl ExtractionSummary {
    /// Starts a new summary with a fresh run id.
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            schema_tables: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Total rows written across all tables.
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).fold(0, u64::saturating_add)
    }

    /// Number of tables that failed.
    pub fn failed_count(&self) -> usize {
        self.tables.iter().filter(|t| !t.is_copied()).count()
    }
}
