//! recordsdb - an embedded records table engine
//!
//! Tables are stored as plain JSON files: one schema document and one
//! row-oriented records array per table. Schemas evolve at runtime by
//! appending columns, and every mutation reconciles the stored rows with
//! the current schema in a typed, column-oriented working copy before the
//! whole table is written back.
//!
//! # Example
//!
//! ```no_run
//! use recordsdb::catalog::{ColumnType, NewColumn};
//! use recordsdb::db::Database;
//! use recordsdb::executor::{Filter, FilterOp, QueryOptions};
//! use serde_json::json;
//!
//! let db = Database::open("./data").unwrap();
//! db.create_table("tasks", "Tasks", None).unwrap();
//! let schema = db
//!     .add_column("tasks", NewColumn::new("Status", ColumnType::Select).with_options(["open", "closed"]))
//!     .unwrap();
//! let status = &schema.column_by_name("Status").unwrap().id;
//!
//! db.insert("tasks", &json!({ status.as_str(): "open" })).unwrap();
//! let open = db
//!     .query("tasks", &QueryOptions::new().filter(Filter::new(status.as_str(), FilterOp::Eq, "open")))
//!     .unwrap();
//! ```

pub mod catalog;
pub mod db;
pub mod executor;
pub mod frame;
pub mod storage;
pub mod validation;

pub use db::{Database, DatabaseConfig, DatabaseError, DatabaseResult};
pub use executor::{ExecuteError, Filter, FilterOp, QueryOptions, Sort};
pub use storage::Row;
