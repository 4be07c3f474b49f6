//! Catalog module for schema management.
//!
//! Schemas live next to the records they describe, one document per table.
//! Columns are append-only and identified by a generated id, never by name.

mod manager;
mod schema;
mod types;

pub use manager::SchemaStore;
pub use schema::{is_system_column, SchemaError, SchemaResult, SchemaVersion, TableSchema};
pub use types::{storage_type_for, ColumnDef, ColumnType, NewColumn, StorageType};
