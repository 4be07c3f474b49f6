//! storage layer for recordsdb
//!
//! this module owns everything that touches the disk. The upper layers
//! (catalog, executor) go through the [`TableStore`] trait and never open
//! files themselves, so the commit strategy can change without touching
//! mutation or alignment logic.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   schemas/<table_id>.json    one TableSchema document per table
//!   records/<table_id>.json    row-oriented array of row objects
//! ```
//!
//! Every write replaces the whole file: the new content is written to a
//! temporary file in the same directory and then renamed over the target.
//!
//! # Usage
//!
//! ```ignore
//! use recordsdb::storage::{FileStore, TableId, TableStore};
//!
//! let store = FileStore::open("./data", true)?;
//! let table = TableId::new("tasks")?;
//! let rows = store.read_records(&table)?;
//! store.write_records(&table, &rows)?;
//! ```

mod error;
mod memory;
mod repository;
mod row;
mod types;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use repository::{FileStore, TableStore};
pub use row::{deserialize_records, serialize_records, Row, CREATED_FIELD, ID_FIELD, SYSTEM_FIELDS, UPDATED_FIELD};
pub use types::{new_column_id, new_row_id, InvalidNameError, TableId};
