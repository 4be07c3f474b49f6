//! In-process table store.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::storage::error::StorageResult;
use crate::storage::repository::TableStore;
use crate::storage::row::Row;
use crate::storage::types::TableId;

/// Keeps schemas and records in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schemas: RwLock<HashMap<TableId, Value>>,
    records: RwLock<HashMap<TableId, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryStore {
    fn read_schema(&self, table: &TableId) -> StorageResult<Option<Value>> {
        Ok(self.schemas.read().get(table).cloned())
    }

    fn write_schema(&self, table: &TableId, schema: &Value) -> StorageResult<()> {
        self.schemas.write().insert(table.clone(), schema.clone());
        Ok(())
    }

    fn read_records(&self, table: &TableId) -> StorageResult<Vec<Row>> {
        Ok(self.records.read().get(table).cloned().unwrap_or_default())
    }

    fn write_records(&self, table: &TableId, rows: &[Row]) -> StorageResult<()> {
        self.records.write().insert(table.clone(), rows.to_vec());
        Ok(())
    }

    fn remove_table(&self, table: &TableId) -> StorageResult<bool> {
        let schema = self.schemas.write().remove(table).is_some();
        let records = self.records.write().remove(table).is_some();
        Ok(schema || records)
    }

    fn table_ids(&self) -> StorageResult<Vec<TableId>> {
        let mut ids: Vec<TableId> = self.schemas.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
