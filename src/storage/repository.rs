//! The persistence boundary and its file-backed implementation.
//!
//! Schemas travel through the store as raw JSON documents; the catalog owns
//! their typed form. Records travel as whole tables: there is no partial or
//! incremental write.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::row::{deserialize_records, serialize_records, Row};
use crate::storage::types::TableId;

const SCHEMA_DIR: &str = "schemas";
const RECORDS_DIR: &str = "records";
const FILE_EXT: &str = "json";

/// Read and replace whole-table artifacts.
///
/// Implementations decide how a commit is made durable. Callers assume
/// nothing beyond "the last completed write wins".
pub trait TableStore: Send + Sync {
    /// Load the schema document for a table. `None` when the table has no schema.
    fn read_schema(&self, table: &TableId) -> StorageResult<Option<Value>>;

    /// Replace the schema document for a table.
    fn write_schema(&self, table: &TableId, schema: &Value) -> StorageResult<()>;

    /// Load every row of a table. A table that was never written is empty.
    fn read_records(&self, table: &TableId) -> StorageResult<Vec<Row>>;

    /// Replace every row of a table.
    fn write_records(&self, table: &TableId, rows: &[Row]) -> StorageResult<()>;

    /// Remove schema and records. Returns false if neither existed.
    fn remove_table(&self, table: &TableId) -> StorageResult<bool>;

    /// Ids of every table that has a schema, sorted.
    fn table_ids(&self) -> StorageResult<Vec<TableId>>;
}

/// Stores each table as two pretty-printed JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    sync_writes: bool,
}

impl FileStore {
    /// Open a store rooted at `root`.
    ///
    /// With `create_if_missing` the directory tree is created; otherwise a
    /// missing root is an error.
    pub fn open(root: impl AsRef<Path>, create_if_missing: bool) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() && !create_if_missing {
            return Err(StorageError::RootNotFound(root));
        }

        fs::create_dir_all(root.join(SCHEMA_DIR))?;
        fs::create_dir_all(root.join(RECORDS_DIR))?;

        Ok(Self {
            root,
            sync_writes: true,
        })
    }

    /// Whether temp files are fsynced before being renamed into place.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema_path(&self, table: &TableId) -> PathBuf {
        self.root
            .join(SCHEMA_DIR)
            .join(format!("{}.{}", table, FILE_EXT))
    }

    pub fn records_path(&self, table: &TableId) -> PathBuf {
        self.root
            .join(RECORDS_DIR)
            .join(format!("{}.{}", table, FILE_EXT))
    }

    /// Write to a temp file in the target directory, then rename over the target.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let dir = path.parent().unwrap_or(&self.root);
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        if self.sync_writes {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> StorageResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl TableStore for FileStore {
    fn read_schema(&self, table: &TableId) -> StorageResult<Option<Value>> {
        let path = self.schema_path(table);
        match read_optional(&path)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_schema(&self, table: &TableId, schema: &Value) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(schema)?;
        self.write_atomic(&self.schema_path(table), &bytes)
    }

    fn read_records(&self, table: &TableId) -> StorageResult<Vec<Row>> {
        let path = self.records_path(table);
        match read_optional(&path)? {
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Some(bytes) => deserialize_records(&bytes, &path),
            None => Ok(Vec::new()),
        }
    }

    fn write_records(&self, table: &TableId, rows: &[Row]) -> StorageResult<()> {
        let bytes = serialize_records(rows)?;
        self.write_atomic(&self.records_path(table), &bytes)
    }

    fn remove_table(&self, table: &TableId) -> StorageResult<bool> {
        let schema_removed = remove_optional(&self.schema_path(table))?;
        let records_removed = remove_optional(&self.records_path(table))?;
        Ok(schema_removed || records_removed)
    }

    fn table_ids(&self) -> StorageResult<Vec<TableId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(SCHEMA_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXT) {
                continue;
            }
            // temp files and hand-edited leftovers are skipped, not fatal
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| TableId::new(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
