//! High-level Database API.
//!
//! [`Database`] is the entry point for embedding the engine: it owns the
//! storage backend and the executor, and addresses tables by plain string
//! ids.

mod api;
mod config;

pub use api::{Database, DatabaseError, DatabaseResult};
pub use config::DatabaseConfig;
