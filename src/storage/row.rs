//! Row representation and the records file codec.
//!
//! A row is a JSON object keyed by column id. Three system fields are
//! present on every row written by the engine:
//!
//! ```text
//! {
//!   "id": "01hx3k9v2c8n4q7r5t6w0y1z2a",
//!   "_created": "2024-05-01T09:30:00.000Z",
//!   "_updated": "2024-05-02T11:00:00.000Z",
//!   "k3m9x0p2qa": "open"
//! }
//! ```
//!
//! Key order is preserved, so a row written after alignment follows the
//! schema's column order on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::error::{StorageError, StorageResult};

/// row identifier field
pub const ID_FIELD: &str = "id";
/// creation timestamp field, set once at insert
pub const CREATED_FIELD: &str = "_created";
/// modification timestamp field, set at insert and on every update
pub const UPDATED_FIELD: &str = "_updated";
/// the fields the engine owns on every row
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, CREATED_FIELD, UPDATED_FIELD];

/// a single record: column id -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// create a row from a JSON value (must be an object)
    pub fn from_value(value: Value) -> StorageResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StorageError::CorruptedData {
                path: Default::default(),
                reason: format!("row must be a JSON object, got {}", other),
            }),
        }
    }

    /// the row identifier, if present and a string
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// get a column value by id
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// set a column value, returning the previous one
    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.shift_remove(column)
    }

    /// check if the row has an explicit key for a column
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// serialize a full table to the records file format
pub fn serialize_records(rows: &[Row]) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(rows)?)
}

/// deserialize a records file
///
/// `path` is only used for error reporting.
pub fn deserialize_records(bytes: &[u8], path: &Path) -> StorageResult<Vec<Row>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Array(items) = value else {
        return Err(StorageError::CorruptedData {
            path: path.to_path_buf(),
            reason: "records file must contain a JSON array".into(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(Row(map)),
            _ => Err(StorageError::CorruptedData {
                path: path.to_path_buf(),
                reason: format!("entry {} is not a JSON object", i),
            }),
        })
        .collect()
}
