//! Per-column validation rules.

use std::fmt;

use serde_json::{Number, Value};

use crate::catalog::{ColumnDef, ColumnType};

/// The closed set of checks a column can impose on a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Any string.
    Text,
    /// Any JSON number an f64 holds exactly.
    Number,
    /// Any string. Dates are not parsed.
    Date,
    Boolean,
    /// A string from a fixed set.
    OneOf(Vec<String>),
}

impl FieldRule {
    /// Derive the rule for a column. A select without options accepts any string.
    pub fn for_column(column: &ColumnDef) -> Self {
        match column.column_type {
            ColumnType::Text => FieldRule::Text,
            ColumnType::Number => FieldRule::Number,
            ColumnType::Date => FieldRule::Date,
            ColumnType::Boolean => FieldRule::Boolean,
            ColumnType::Select => match column.select_options() {
                Some(options) => FieldRule::OneOf(options.to_vec()),
                None => FieldRule::Text,
            },
        }
    }

    /// Check a non-null value.
    pub fn check(&self, value: &Value) -> Result<(), FieldErrorKind> {
        match (self, value) {
            (FieldRule::Text | FieldRule::Date, Value::String(_)) => Ok(()),
            (FieldRule::Number, Value::Number(n)) => {
                if is_exact(n) {
                    Ok(())
                } else {
                    Err(FieldErrorKind::OutOfRange {
                        value: n.to_string(),
                    })
                }
            }
            (FieldRule::Boolean, Value::Bool(_)) => Ok(()),
            (FieldRule::OneOf(options), Value::String(s)) => {
                if options.iter().any(|o| o == s) {
                    Ok(())
                } else {
                    Err(FieldErrorKind::InvalidOption {
                        value: s.clone(),
                        allowed: options.clone(),
                    })
                }
            }
            (rule, other) => Err(FieldErrorKind::WrongType {
                expected: rule.expected(),
                found: json_kind(other),
            }),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            FieldRule::Text | FieldRule::Date | FieldRule::OneOf(_) => "string",
            FieldRule::Number => "number",
            FieldRule::Boolean => "boolean",
        }
    }
}

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Numbers are stored as f64; integer literals past 2^53 would come back changed.
fn is_exact(n: &Number) -> bool {
    match (n.as_u64(), n.as_i64()) {
        (Some(u), _) => u <= MAX_SAFE_INTEGER,
        (None, Some(i)) => i.unsigned_abs() <= MAX_SAFE_INTEGER,
        (None, None) => true,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What went wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    InvalidOption {
        value: String,
        allowed: Vec<String>,
    },
    /// An integer too large to store without rounding.
    OutOfRange {
        value: String,
    },
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Column id (the payload key).
    pub column: String,
    /// Column display name, for messages.
    pub name: String,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Required => write!(f, "'{}' is required", self.name),
            FieldErrorKind::WrongType { expected, found } => {
                write!(f, "'{}' expects {}, got {}", self.name, expected, found)
            }
            FieldErrorKind::InvalidOption { value, allowed } => write!(
                f,
                "'{}' must be one of [{}], got '{}'",
                self.name,
                allowed.join(", "),
                value
            ),
            FieldErrorKind::OutOfRange { value } => write!(
                f,
                "'{}' cannot hold {} exactly, integers are limited to +/-{}",
                self.name, value, MAX_SAFE_INTEGER
            ),
        }
    }
}
