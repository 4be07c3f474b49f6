//! Table operations: insert, update, delete and query.
//!
//! Mutations follow one cycle: load the schema, validate the payload,
//! align stored data to the schema, apply a pure transform, then commit
//! the whole table. Queries load and reconcile rows but never validate.

mod error;
mod eval;
mod executor;
mod mutation;
mod query;

pub use error::{ExecuteError, ExecuteResult};
pub use eval::{compare_values, matches_filter, values_equal};
pub use executor::{Executor, ExecutorOptions};
pub use mutation::{append_row, next_timestamp, remove_row, replace_row, timestamp_now};
pub use query::{run_query, Filter, FilterOp, QueryOptions, Sort};
