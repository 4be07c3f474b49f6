//! In-memory columnar tables and schema alignment.
//!
//! Mutations load the row-oriented records file into a [`Frame`], where
//! every column has a single concrete type. Frames are only ever combined
//! after [`align_table`] (or [`align_to`]) has given both sides the same
//! columns, order and types.

mod align;
mod column;
mod error;
mod table;

pub use align::{align_row, align_table, align_to, check_types};
pub use column::{Column, ColumnData};
pub use error::{FrameError, FrameResult};
pub use table::Frame;
