//! Schema persistence and retrieval.

use std::sync::Arc;

use tracing::{debug, info};

use super::schema::{SchemaError, SchemaResult, TableSchema};
use super::types::NewColumn;
use crate::storage::{TableId, TableStore};

/// Reads and writes table schemas through a [`TableStore`].
#[derive(Clone)]
pub struct SchemaStore {
    store: Arc<dyn TableStore>,
}

impl SchemaStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Load a schema. A table without a schema is `Ok(None)`, not an error.
    pub fn read_schema(&self, table: &TableId) -> SchemaResult<Option<TableSchema>> {
        let Some(doc) = self.store.read_schema(table)? else {
            return Ok(None);
        };

        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| SchemaError::Corrupted {
                table: table.clone(),
                reason: e.to_string(),
            })
    }

    /// Load a schema, failing with `TableNotFound` if absent.
    pub fn require_schema(&self, table: &TableId) -> SchemaResult<TableSchema> {
        self.read_schema(table)?
            .ok_or_else(|| SchemaError::TableNotFound(table.clone()))
    }

    /// Check if a table has a schema.
    pub fn table_exists(&self, table: &TableId) -> SchemaResult<bool> {
        Ok(self.store.read_schema(table)?.is_some())
    }

    /// Overwrite the stored schema, stamping `last_modified`.
    pub fn write_schema(&self, table: &TableId, schema: &mut TableSchema) -> SchemaResult<()> {
        schema.touch();
        let doc = serde_json::to_value(&*schema).map_err(crate::storage::StorageError::from)?;
        self.store.write_schema(table, &doc)?;
        debug!(table = %table, version = schema.version, "schema written");
        Ok(())
    }

    /// Create and persist a schema seeded with the system columns.
    pub fn create_table_schema(
        &self,
        table: &TableId,
        name: &str,
        description: Option<&str>,
    ) -> SchemaResult<TableSchema> {
        if self.table_exists(table)? {
            return Err(SchemaError::TableExists(table.clone()));
        }

        let mut schema = TableSchema::new(table.clone(), name);
        if let Some(desc) = description {
            schema = schema.with_description(desc);
        }
        self.write_schema(table, &mut schema)?;

        info!(table = %table, name, "created table schema");
        Ok(schema)
    }

    /// Append a column to a table's schema and persist it.
    pub fn add_column(&self, table: &TableId, column: NewColumn) -> SchemaResult<TableSchema> {
        let mut schema = self.require_schema(table)?;
        let added = schema.add_column(column)?;
        info!(
            table = %table,
            column = %added.id,
            name = %added.name,
            column_type = %added.column_type,
            "added column"
        );

        self.write_schema(table, &mut schema)?;
        Ok(schema)
    }

    /// Remove a table's schema and records.
    pub fn drop_table(&self, table: &TableId) -> SchemaResult<()> {
        if !self.table_exists(table)? {
            return Err(SchemaError::TableNotFound(table.clone()));
        }
        self.store.remove_table(table)?;
        info!(table = %table, "dropped table");
        Ok(())
    }

    /// List the ids of every table with a schema.
    pub fn list_tables(&self) -> SchemaResult<Vec<TableId>> {
        Ok(self.store.table_ids()?)
    }
}
