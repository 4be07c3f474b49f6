//! Database API - high-level interface for recordsdb.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::config::DatabaseConfig;
use crate::catalog::{NewColumn, SchemaError, TableSchema};
use crate::executor::{ExecuteError, Executor, QueryOptions};
use crate::storage::{FileStore, InvalidNameError, MemoryStore, Row, StorageError, TableId, TableStore};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error("database not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DatabaseError {
    /// The engine-level error, if this is one.
    pub fn as_execute(&self) -> Option<&ExecuteError> {
        match self {
            DatabaseError::Execute(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            DatabaseError::Execute(e) => e.is_not_found(),
            DatabaseError::NotFound(_) => true,
            DatabaseError::InvalidConfig(_) => false,
        }
    }

    pub fn is_client_error(&self) -> bool {
        match self {
            DatabaseError::Execute(e) => e.is_client_error(),
            DatabaseError::NotFound(_) | DatabaseError::InvalidConfig(_) => false,
        }
    }
}

impl From<SchemaError> for DatabaseError {
    fn from(err: SchemaError) -> Self {
        DatabaseError::Execute(err.into())
    }
}

impl From<StorageError> for DatabaseError {
    fn from(err: StorageError) -> Self {
        DatabaseError::Execute(err.into())
    }
}

impl From<InvalidNameError> for DatabaseError {
    fn from(err: InvalidNameError) -> Self {
        DatabaseError::Execute(err.into())
    }
}

/// The main database handle.
///
/// All operations take `&self`; the handle can be shared across threads.
/// Writers to the same table are not coordinated.
pub struct Database {
    config: DatabaseConfig,
    executor: Executor,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref()))
    }

    /// Open or create a database with custom configuration.
    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        if !config.create_if_missing && !config.path.exists() {
            return Err(DatabaseError::NotFound(config.path.clone()));
        }

        let store = FileStore::open(&config.path, config.create_if_missing)?
            .with_sync_writes(config.sync_writes);
        info!(path = %config.path.display(), "opened database");
        Self::with_store(Arc::new(store), config)
    }

    /// Create a database that keeps everything in memory.
    pub fn in_memory() -> DatabaseResult<Self> {
        Self::with_store(Arc::new(MemoryStore::new()), DatabaseConfig::default())
    }

    /// Run the engine over any [`TableStore`]. `config.path` is not used.
    pub fn with_store(store: Arc<dyn TableStore>, config: DatabaseConfig) -> DatabaseResult<Self> {
        if config.default_limit == 0 {
            return Err(DatabaseError::InvalidConfig(
                "default_limit must be at least 1".into(),
            ));
        }

        let executor = Executor::new(store, config.executor_options());
        Ok(Self { config, executor })
    }

    /// Create a table with the system columns only.
    ///
    /// Fails with `TableExists` rather than replacing an existing schema.
    pub fn create_table(
        &self,
        table: &str,
        name: &str,
        description: Option<&str>,
    ) -> DatabaseResult<TableSchema> {
        let table = TableId::new(table)?;
        Ok(self
            .executor
            .schemas()
            .create_table_schema(&table, name, description)?)
    }

    /// Remove a table's schema and all its rows.
    pub fn drop_table(&self, table: &str) -> DatabaseResult<()> {
        let table = TableId::new(table)?;
        self.executor.schemas().drop_table(&table)?;
        self.executor.evict(&table);
        Ok(())
    }

    /// Append a column. Rows stored before the call read it as null.
    pub fn add_column(&self, table: &str, column: NewColumn) -> DatabaseResult<TableSchema> {
        let table = TableId::new(table)?;
        Ok(self.executor.schemas().add_column(&table, column)?)
    }

    /// Get the schema for a table, `None` if it doesn't exist.
    pub fn schema(&self, table: &str) -> DatabaseResult<Option<TableSchema>> {
        let table = TableId::new(table)?;
        Ok(self.executor.schemas().read_schema(&table)?)
    }

    /// Check if a table exists.
    pub fn table_exists(&self, table: &str) -> DatabaseResult<bool> {
        let table = TableId::new(table)?;
        Ok(self.executor.schemas().table_exists(&table)?)
    }

    /// List all tables.
    pub fn list_tables(&self) -> DatabaseResult<Vec<TableId>> {
        Ok(self.executor.schemas().list_tables()?)
    }

    /// Insert a row. `payload` is an object keyed by column id.
    pub fn insert(&self, table: &str, payload: &Value) -> DatabaseResult<Row> {
        let table = TableId::new(table)?;
        Ok(self.executor.insert(&table, payload)?)
    }

    /// Change some fields of a row.
    pub fn update(&self, table: &str, row_id: &str, updates: &Value) -> DatabaseResult<Row> {
        let table = TableId::new(table)?;
        Ok(self.executor.update(&table, row_id, updates)?)
    }

    pub fn delete(&self, table: &str, row_id: &str) -> DatabaseResult<()> {
        let table = TableId::new(table)?;
        Ok(self.executor.delete(&table, row_id)?)
    }

    /// Filter, sort and page through a table.
    pub fn query(&self, table: &str, options: &QueryOptions) -> DatabaseResult<Vec<Row>> {
        let table = TableId::new(table)?;
        Ok(self.executor.query(&table, options)?)
    }

    pub fn get_row(&self, table: &str, row_id: &str) -> DatabaseResult<Row> {
        let table = TableId::new(table)?;
        Ok(self.executor.get_row(&table, row_id)?)
    }

    pub fn count_rows(&self, table: &str) -> DatabaseResult<usize> {
        let table = TableId::new(table)?;
        Ok(self.executor.count_rows(&table)?)
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
