//! In-memory table errors.

use thiserror::Error;

pub type FrameResult<T> = Result<T, FrameError>;

/// Failures building or combining columnar tables.
///
/// Any of these during a mutation means stored data and schema disagree
/// in a way alignment cannot repair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("column '{column}' mixes {expected} and {found} values")]
    MixedTypes {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column '{column}' holds an unsupported {found} value")]
    UnsupportedValue { column: String, found: &'static str },

    #[error("column '{column}' type mismatch: {left} vs {right}")]
    TypeMismatch {
        column: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("column layout mismatch: [{}] vs [{}]", .left.join(", "), .right.join(", "))]
    ShapeMismatch { left: Vec<String>, right: Vec<String> },

    #[error("column '{column}' has {found} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}
