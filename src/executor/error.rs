//! Engine errors.

use thiserror::Error;

use crate::catalog::SchemaError;
use crate::frame::FrameError;
use crate::storage::{InvalidNameError, StorageError, TableId};
use crate::validation::ValidationError;

/// Result type for engine operations.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Errors surfaced by table operations.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("table not found: {0}")]
    TableNotFound(TableId),

    #[error("table already exists: {0}")]
    TableExists(TableId),

    #[error("row {row} not found in table {table}")]
    RowNotFound { table: TableId, row: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("invalid column: {0}")]
    InvalidColumn(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid table id: {0}")]
    InvalidTableId(#[from] InvalidNameError),

    /// Stored data could not be reconciled with the schema. Signals a
    /// corrupted records file or an engine defect.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] FrameError),

    #[error("corrupted schema for {table}: {reason}")]
    CorruptedSchema { table: TableId, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ExecuteError {
    /// The addressed table or row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExecuteError::TableNotFound(_) | ExecuteError::RowNotFound { .. }
        )
    }

    /// The caller sent something the engine refuses, as opposed to a
    /// storage or consistency failure on the engine's side.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ExecuteError::SchemaMismatch(_)
                | ExecuteError::CorruptedSchema { .. }
                | ExecuteError::Storage(_)
        )
    }
}

impl From<SchemaError> for ExecuteError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::TableNotFound(table) => ExecuteError::TableNotFound(table),
            SchemaError::TableExists(table) => ExecuteError::TableExists(table),
            SchemaError::DuplicateColumn(name) => ExecuteError::DuplicateColumn(name),
            SchemaError::InvalidColumn(reason) => ExecuteError::InvalidColumn(reason),
            SchemaError::Corrupted { table, reason } => ExecuteError::CorruptedSchema { table, reason },
            SchemaError::Storage(e) => ExecuteError::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableId {
        TableId::new("tasks").unwrap()
    }

    #[test]
    fn test_schema_error_mapping() {
        let err: ExecuteError = SchemaError::TableNotFound(table()).into();
        assert!(matches!(err, ExecuteError::TableNotFound(_)));
        assert!(err.is_not_found());

        let err: ExecuteError = SchemaError::DuplicateColumn("Status".into()).into();
        assert!(matches!(err, ExecuteError::DuplicateColumn(ref n) if n == "Status"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_classification() {
        let err = ExecuteError::RowNotFound {
            table: table(),
            row: "01j0".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "row 01j0 not found in table tasks");

        let err = ExecuteError::SchemaMismatch(FrameError::DuplicateColumn("x".into()));
        assert!(!err.is_not_found());
        assert!(!err.is_client_error());
    }
}
