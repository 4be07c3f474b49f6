//! Load, transform and commit cycle for table operations.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::{ExecuteError, ExecuteResult};
use super::mutation::{
    append_row, find_row, remove_row, replace_row, stamp_new_row, timestamp_now,
};
use super::query::{run_query, QueryOptions};
use crate::catalog::{is_system_column, SchemaStore, TableSchema};
use crate::frame::{align_row, align_table, Frame, FrameError};
use crate::storage::{new_row_id, Row, TableId, TableStore};
use crate::validation::Validator;

/// Behaviour switches for the executor.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Check update values against their column rules.
    pub validate_updates: bool,
    /// Page size for queries without a limit.
    pub default_limit: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            validate_updates: true,
            default_limit: 100,
        }
    }
}

/// Runs mutations and queries against a [`TableStore`].
///
/// Every mutation reads the whole table, transforms it in memory and
/// writes the whole table back. Nothing here coordinates concurrent
/// writers: the last rewrite of a table wins.
pub struct Executor {
    store: Arc<dyn TableStore>,
    schemas: SchemaStore,
    options: ExecutorOptions,
    validators: RwLock<HashMap<TableId, Arc<Validator>>>,
}

impl Executor {
    pub fn new(store: Arc<dyn TableStore>, options: ExecutorOptions) -> Self {
        Self {
            schemas: SchemaStore::new(store.clone()),
            store,
            options,
            validators: RwLock::new(HashMap::new()),
        }
    }

    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    pub fn options(&self) -> ExecutorOptions {
        self.options
    }

    /// The validator for the schema's current version, built on first use.
    pub fn validator(&self, schema: &TableSchema) -> Arc<Validator> {
        if let Some(cached) = self.validators.read().get(&schema.id) {
            if cached.version() == schema.version {
                return cached.clone();
            }
        }

        let validator = Arc::new(Validator::build(schema));
        debug!(table = %schema.id, version = schema.version, "built validator");
        self.validators
            .write()
            .insert(schema.id.clone(), validator.clone());
        validator
    }

    /// Forget the cached validator of a table.
    pub fn evict(&self, table: &TableId) {
        self.validators.write().remove(table);
    }

    /// Validate and append a new row. Returns the stored row.
    pub fn insert(&self, table: &TableId, payload: &Value) -> ExecuteResult<Row> {
        let schema = self.schemas.require_schema(table)?;
        let payload = as_object(payload)?;
        let clean = self.validator(&schema).validate(payload)?;

        let now = timestamp_now();
        let row = stamp_new_row(clean, new_row_id(), &now);
        let row_id = row.id().unwrap_or_default().to_string();

        let existing = self.load_frame(table, &schema)?;
        let (updated, row) = append_row(existing, row, &schema).map_err(|e| mismatch(table, e))?;
        self.store.write_records(table, &updated.to_rows())?;

        debug!(table = %table, row = %row_id, rows = updated.height(), "inserted row");
        Ok(row)
    }

    /// Merge `updates` into an existing row and bump its `_updated` stamp.
    ///
    /// System fields and keys that are not user columns are ignored. With
    /// `validate_updates` the supplied values are checked against their
    /// column rules; absent columns are left as they are.
    pub fn update(&self, table: &TableId, row_id: &str, updates: &Value) -> ExecuteResult<Row> {
        let schema = self.schemas.require_schema(table)?;
        let updates = as_object(updates)?;

        let rows = self.load_frame(table, &schema)?.to_rows();
        let index = find_row(&rows, row_id).ok_or_else(|| ExecuteError::RowNotFound {
            table: table.clone(),
            row: row_id.to_string(),
        })?;

        let changes = if self.options.validate_updates {
            self.validator(&schema).validate_partial(updates)?
        } else {
            user_columns_only(updates, &schema)
        };

        let (updated, row) = replace_row(rows, index, changes, &schema).map_err(|e| mismatch(table, e))?;
        self.store.write_records(table, &updated.to_rows())?;

        debug!(table = %table, row = %row_id, "updated row");
        Ok(row)
    }

    /// Remove the row with the given id.
    pub fn delete(&self, table: &TableId, row_id: &str) -> ExecuteResult<()> {
        self.schemas.require_schema(table)?;
        let rows = self.store.read_records(table)?;
        let before = rows.len();

        let kept = remove_row(rows, row_id).ok_or_else(|| ExecuteError::RowNotFound {
            table: table.clone(),
            row: row_id.to_string(),
        })?;
        self.store.write_records(table, &kept)?;

        debug!(table = %table, row = %row_id, removed = before - kept.len(), "deleted row");
        Ok(())
    }

    /// Filter, sort and paginate a table's rows.
    ///
    /// Reads are not validated; every returned row carries a key for each
    /// schema column, null where the stored row has none.
    pub fn query(&self, table: &TableId, options: &QueryOptions) -> ExecuteResult<Vec<Row>> {
        let rows = self.load_rows(table)?;
        let total = rows.len();
        let out = run_query(rows, options, self.options.default_limit);
        debug!(table = %table, total, returned = out.len(), "query");
        Ok(out)
    }

    /// Fetch one row by id.
    pub fn get_row(&self, table: &TableId, row_id: &str) -> ExecuteResult<Row> {
        self.load_rows(table)?
            .into_iter()
            .find(|r| r.id() == Some(row_id))
            .ok_or_else(|| ExecuteError::RowNotFound {
                table: table.clone(),
                row: row_id.to_string(),
            })
    }

    pub fn count_rows(&self, table: &TableId) -> ExecuteResult<usize> {
        self.schemas.require_schema(table)?;
        Ok(self.store.read_records(table)?.len())
    }

    fn load_rows(&self, table: &TableId) -> ExecuteResult<Vec<Row>> {
        let schema = self.schemas.require_schema(table)?;
        Ok(self
            .store
            .read_records(table)?
            .into_iter()
            .map(|row| align_row(row, &schema))
            .collect())
    }

    /// Load the stored table as an aligned frame.
    fn load_frame(&self, table: &TableId, schema: &TableSchema) -> ExecuteResult<Frame> {
        let rows = self.store.read_records(table)?;
        let frame = Frame::from_rows(&rows).map_err(|e| mismatch(table, e))?;
        Ok(align_table(frame, schema))
    }
}

fn as_object(payload: &Value) -> ExecuteResult<&Map<String, Value>> {
    payload.as_object().ok_or_else(|| {
        ExecuteError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            crate::validation::json_kind(payload)
        ))
    })
}

/// Keep only keys naming a user column of `schema`.
fn user_columns_only(updates: &Map<String, Value>, schema: &TableSchema) -> Row {
    updates
        .iter()
        .filter(|(key, _)| !is_system_column(key) && schema.column(key).is_some())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn mismatch(table: &TableId, err: FrameError) -> ExecuteError {
    warn!(table = %table, error = %err, "stored data does not match schema");
    ExecuteError::SchemaMismatch(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, NewColumn};
    use crate::storage::{FileStore, MemoryStore, CREATED_FIELD, UPDATED_FIELD};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        executor: Executor,
        table: TableId,
        status: String,
        priority: String,
    }

    fn setup_with(store: Arc<dyn TableStore>, options: ExecutorOptions) -> Fixture {
        let executor = Executor::new(store, options);
        let table = TableId::new("tasks").unwrap();
        executor
            .schemas()
            .create_table_schema(&table, "Tasks", None)
            .unwrap();
        let schema = executor
            .schemas()
            .add_column(
                &table,
                NewColumn::new("Status", ColumnType::Select)
                    .required(true)
                    .with_options(["open", "closed"]),
            )
            .unwrap();
        let status = schema.column_by_name("status").unwrap().id.clone();
        let schema = executor
            .schemas()
            .add_column(&table, NewColumn::new("Priority", ColumnType::Number))
            .unwrap();
        let priority = schema.column_by_name("priority").unwrap().id.clone();
        Fixture { executor, table, status, priority }
    }

    fn setup() -> Fixture {
        setup_with(Arc::new(MemoryStore::new()), ExecutorOptions::default())
    }

    fn payload(f: &Fixture, status: &str, priority: Value) -> Value {
        let mut map = Map::new();
        map.insert(f.status.clone(), json!(status));
        map.insert(f.priority.clone(), priority);
        Value::Object(map)
    }

    #[test]
    fn test_insert_stamps_system_fields() {
        let f = setup();
        let row = f.executor.insert(&f.table, &payload(&f, "open", json!(2))).unwrap();

        assert_eq!(row.id().unwrap().len(), 26);
        assert_eq!(row.get(CREATED_FIELD), row.get(UPDATED_FIELD));
        assert_eq!(row.get(&f.status), Some(&json!("open")));
        assert_eq!(row.get(&f.priority), Some(&json!(2)));
        assert_eq!(f.executor.count_rows(&f.table).unwrap(), 1);
    }

    #[test]
    fn test_insert_ignores_forged_system_fields() {
        let f = setup();
        let mut body = payload(&f, "open", Value::Null);
        body["id"] = json!("forged");
        body["_created"] = json!("1999-01-01T00:00:00.000Z");

        let row = f.executor.insert(&f.table, &body).unwrap();
        assert_ne!(row.id(), Some("forged"));
        assert_ne!(row.get(CREATED_FIELD), Some(&json!("1999-01-01T00:00:00.000Z")));
    }

    #[test]
    fn test_insert_errors() {
        let f = setup();
        let err = f.executor.insert(&f.table, &json!({})).unwrap_err();
        match err {
            ExecuteError::Validation(v) => assert!(v.has_error_for(&f.status)),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = f.executor.insert(&f.table, &json!([1])).unwrap_err();
        assert!(matches!(err, ExecuteError::InvalidPayload(_)));

        let missing = TableId::new("missing").unwrap();
        let err = f.executor.insert(&missing, &json!({})).unwrap_err();
        assert!(matches!(err, ExecuteError::TableNotFound(_)));
    }

    #[test]
    fn test_update_validates_supplied_values() {
        let f = setup();
        let row = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap();
        let id = row.id().unwrap();

        let mut bad = Map::new();
        bad.insert(f.status.clone(), json!("pending"));
        let err = f.executor.update(&f.table, id, &Value::Object(bad)).unwrap_err();
        assert!(matches!(err, ExecuteError::Validation(_)));

        // absent required columns are fine in an update
        let mut ok = Map::new();
        ok.insert(f.priority.clone(), json!(5));
        let updated = f.executor.update(&f.table, id, &Value::Object(ok)).unwrap();
        assert_eq!(updated.get(&f.status), Some(&json!("open")));
        assert_eq!(updated.get(&f.priority), Some(&json!(5)));
    }

    #[test]
    fn test_unvalidated_update_conflict_is_schema_mismatch() {
        let options = ExecutorOptions {
            validate_updates: false,
            ..Default::default()
        };
        let f = setup_with(Arc::new(MemoryStore::new()), options);
        let row = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap();

        let mut bad = Map::new();
        bad.insert(f.priority.clone(), json!("high"));
        bad.insert("unknown".to_string(), json!(1));
        let err = f
            .executor
            .update(&f.table, row.id().unwrap(), &Value::Object(bad))
            .unwrap_err();
        assert!(matches!(err, ExecuteError::SchemaMismatch(_)));

        // the stored row is untouched
        let stored = f.executor.get_row(&f.table, row.id().unwrap()).unwrap();
        assert_eq!(stored.get(&f.priority), Some(&json!(1)));
    }

    #[test]
    fn test_update_and_delete_missing_row() {
        let f = setup();
        let err = f.executor.update(&f.table, "nope", &json!({})).unwrap_err();
        assert!(err.is_not_found());

        let err = f.executor.delete(&f.table, "nope").unwrap_err();
        assert!(matches!(err, ExecuteError::RowNotFound { .. }));
    }

    #[test]
    fn test_delete_twice() {
        let f = setup();
        let a = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap();
        f.executor.insert(&f.table, &payload(&f, "closed", json!(2))).unwrap();

        f.executor.delete(&f.table, a.id().unwrap()).unwrap();
        assert_eq!(f.executor.count_rows(&f.table).unwrap(), 1);
        assert!(f.executor.delete(&f.table, a.id().unwrap()).is_err());
    }

    #[test]
    fn test_validator_cache_follows_version() {
        let f = setup();
        let schema = f.executor.schemas().require_schema(&f.table).unwrap();
        let first = f.executor.validator(&schema);
        assert!(Arc::ptr_eq(&first, &f.executor.validator(&schema)));

        let schema = f
            .executor
            .schemas()
            .add_column(&f.table, NewColumn::new("Owner", ColumnType::Text).required(true))
            .unwrap();
        let rebuilt = f.executor.validator(&schema);
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.version(), schema.version);

        // new required column is enforced on the next insert
        let err = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap_err();
        assert!(matches!(err, ExecuteError::Validation(_)));
    }

    #[test]
    fn test_corrupt_records_surface_as_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path(), true).unwrap());
        let f = setup_with(store.clone(), ExecutorOptions::default());

        let mut bad = Row::from_value(json!({"id": "a"})).unwrap();
        bad.insert(f.priority.clone(), json!("high"));
        let mut ok = Row::from_value(json!({"id": "b"})).unwrap();
        ok.insert(f.priority.clone(), json!(3));
        store.write_records(&f.table, &[bad, ok]).unwrap();

        let err = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap_err();
        assert!(matches!(err, ExecuteError::SchemaMismatch(_)));

        // reads do not reconcile types, so the rows are still visible
        assert_eq!(f.executor.query(&f.table, &QueryOptions::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_null_into_mistyped_column() {
        let store = Arc::new(MemoryStore::new());
        let f = setup_with(store.clone(), ExecutorOptions::default());

        let mut bad = Row::from_value(json!({"id": "a"})).unwrap();
        bad.insert(f.priority.clone(), json!("high"));
        store.write_records(&f.table, &[bad.clone()]).unwrap();

        // leaving the column null must not slip past the stored type
        let err = f.executor.insert(&f.table, &payload(&f, "open", Value::Null)).unwrap_err();
        assert!(matches!(err, ExecuteError::SchemaMismatch(_)));

        let err = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap_err();
        assert!(matches!(err, ExecuteError::SchemaMismatch(_)));
        assert_eq!(store.read_records(&f.table).unwrap(), vec![bad]);
    }

    #[test]
    fn test_insert_keeps_rows_without_columns() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path(), true).unwrap());
        let f = setup_with(store.clone(), ExecutorOptions::default());
        store.write_records(&f.table, &[Row::new(), Row::new()]).unwrap();

        let err = f.executor.insert(&f.table, &payload(&f, "open", json!(1))).unwrap_err();
        assert!(matches!(err, ExecuteError::SchemaMismatch(_)));
        assert_eq!(f.executor.count_rows(&f.table).unwrap(), 2);
    }

    #[test]
    fn test_insert_large_integers() {
        let f = setup();
        let row = f
            .executor
            .insert(&f.table, &payload(&f, "open", json!(9_007_199_254_740_991_u64)))
            .unwrap();
        let stored = f.executor.get_row(&f.table, row.id().unwrap()).unwrap();
        assert_eq!(stored.get(&f.priority), Some(&json!(9_007_199_254_740_991_u64)));

        let err = f
            .executor
            .insert(&f.table, &payload(&f, "open", json!(9_007_199_254_740_993_u64)))
            .unwrap_err();
        match err {
            ExecuteError::Validation(v) => assert!(v.has_error_for(&f.priority)),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(f.executor.count_rows(&f.table).unwrap(), 1);
    }
}
