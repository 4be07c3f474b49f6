//! Table schema definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ColumnDef, ColumnType, NewColumn};
use crate::storage::{new_column_id, StorageError, TableId, CREATED_FIELD, ID_FIELD, UPDATED_FIELD};

/// Schema version, bumped on each column addition.
pub type SchemaVersion = u32;

fn initial_version() -> SchemaVersion {
    1
}

/// Table schema definition.
///
/// `columns` is append-only; its order is the canonical column order of
/// the table both in memory and on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub id: TableId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<ColumnDef>,
    #[serde(default = "initial_version")]
    pub version: SchemaVersion,
    pub last_modified: DateTime<Utc>,
}

impl TableSchema {
    /// Create a schema seeded with the three required system columns.
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            columns: vec![
                ColumnDef::new(ID_FIELD, "ID", ColumnType::Text).required(true),
                ColumnDef::new(CREATED_FIELD, "Created", ColumnType::Date).required(true),
                ColumnDef::new(UPDATED_FIELD, "Updated", ColumnType::Date).required(true),
            ],
            version: initial_version(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Get a column definition by id.
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Case-insensitive lookup by display name.
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnDef> {
        let wanted = name.to_lowercase();
        self.columns.iter().find(|c| c.name.to_lowercase() == wanted)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    /// Columns a caller may write to (everything but the system columns).
    pub fn user_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !is_system_column(&c.id))
    }

    /// Append a column, assigning it a fresh id.
    pub fn add_column(&mut self, column: NewColumn) -> Result<&ColumnDef, SchemaError> {
        if column.name.trim().is_empty() {
            return Err(SchemaError::InvalidColumn("column name cannot be empty".into()));
        }
        if let Some(existing) = self.column_by_name(&column.name) {
            return Err(SchemaError::DuplicateColumn(existing.name.clone()));
        }

        let mut id = new_column_id();
        while self.column(&id).is_some() {
            id = new_column_id();
        }

        self.columns.push(column.into_def(id));
        self.bump_version();
        Ok(&self.columns[self.columns.len() - 1])
    }

    /// Increment the version and update the timestamp.
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Whether a column id is one of the engine-owned row fields.
pub fn is_system_column(id: &str) -> bool {
    id == ID_FIELD || id == CREATED_FIELD || id == UPDATED_FIELD
}

/// Schema-related errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("table not found: {0}")]
    TableNotFound(TableId),

    #[error("table already exists: {0}")]
    TableExists(TableId),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("invalid column: {0}")]
    InvalidColumn(String),

    #[error("corrupted schema for {table}: {reason}")]
    Corrupted { table: TableId, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
