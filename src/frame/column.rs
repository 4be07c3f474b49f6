//! Typed column storage.

use serde_json::{Number, Value};

use super::error::{FrameError, FrameResult};
use crate::catalog::StorageType;
use crate::validation::json_kind;

/// Values of one column, all of a single concrete type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Utf8(Vec<Option<String>>),
    Float8(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    // special case: all null, type not yet known
    Undefined(usize),
}

impl ColumnData {
    /// A column of `len` nulls already carrying a concrete type.
    pub fn typed_nulls(storage_type: StorageType, len: usize) -> Self {
        match storage_type {
            StorageType::String => ColumnData::Utf8(vec![None; len]),
            StorageType::Float64 => ColumnData::Float8(vec![None; len]),
            StorageType::Bool => ColumnData::Bool(vec![None; len]),
        }
    }

    /// Infer a column from JSON values. `None` (absent key) is read as null.
    pub fn from_values<'a, I>(column: &str, values: I) -> FrameResult<Self>
    where
        I: IntoIterator<Item = Option<&'a Value>>,
    {
        let mut data = ColumnData::Undefined(0);
        for value in values {
            data.push(column, value.unwrap_or(&Value::Null))?;
        }
        Ok(data)
    }

    fn push(&mut self, column: &str, value: &Value) -> FrameResult<()> {
        if let ColumnData::Undefined(n) = *self {
            *self = match value {
                Value::Null => ColumnData::Undefined(n + 1),
                Value::String(s) => ColumnData::Utf8(with_last(n, s.clone())),
                Value::Number(num) => match num.as_f64() {
                    Some(f) => ColumnData::Float8(with_last(n, f)),
                    None => ColumnData::Float8(vec![None; n + 1]),
                },
                Value::Bool(b) => ColumnData::Bool(with_last(n, *b)),
                other => {
                    return Err(FrameError::UnsupportedValue {
                        column: column.to_string(),
                        found: json_kind(other),
                    })
                }
            };
            return Ok(());
        }

        match (self, value) {
            (ColumnData::Utf8(v), Value::Null) => v.push(None),
            (ColumnData::Float8(v), Value::Null) => v.push(None),
            (ColumnData::Bool(v), Value::Null) => v.push(None),
            (ColumnData::Utf8(v), Value::String(s)) => v.push(Some(s.clone())),
            (ColumnData::Float8(v), Value::Number(n)) => v.push(n.as_f64()),
            (ColumnData::Bool(v), Value::Bool(b)) => v.push(Some(*b)),
            (data, other) => {
                return Err(FrameError::MixedTypes {
                    column: column.to_string(),
                    expected: data.type_name(),
                    found: json_kind(other),
                })
            }
        }
        Ok(())
    }

    /// The concrete type, or `None` for an all-null untyped column.
    pub fn storage_type(&self) -> Option<StorageType> {
        match self {
            ColumnData::Utf8(_) => Some(StorageType::String),
            ColumnData::Float8(_) => Some(StorageType::Float64),
            ColumnData::Bool(_) => Some(StorageType::Bool),
            ColumnData::Undefined(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.storage_type().map(StorageType::name).unwrap_or("Null")
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Utf8(v) => v.len(),
            ColumnData::Float8(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Undefined(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, ColumnData::Undefined(_))
    }

    /// Give an untyped null column a concrete type. Typed columns are returned as-is.
    pub fn cast_undefined(self, storage_type: StorageType) -> Self {
        match self {
            ColumnData::Undefined(n) => ColumnData::typed_nulls(storage_type, n),
            typed => typed,
        }
    }

    /// Append another column of the same concrete type.
    pub fn extend(&mut self, column: &str, other: ColumnData) -> FrameResult<()> {
        match (&mut *self, other) {
            (ColumnData::Utf8(l), ColumnData::Utf8(r)) => l.extend(r),
            (ColumnData::Float8(l), ColumnData::Float8(r)) => l.extend(r),
            (ColumnData::Bool(l), ColumnData::Bool(r)) => l.extend(r),
            (ColumnData::Undefined(l), ColumnData::Undefined(r)) => *l += r,
            (l, r) => {
                return Err(FrameError::TypeMismatch {
                    column: column.to_string(),
                    left: l.type_name(),
                    right: r.type_name(),
                })
            }
        }
        Ok(())
    }

    /// Read a cell back as JSON.
    pub fn get(&self, idx: usize) -> Value {
        match self {
            ColumnData::Utf8(v) => v
                .get(idx)
                .cloned()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null),
            ColumnData::Float8(v) => v
                .get(idx)
                .copied()
                .flatten()
                .map(f64_to_json)
                .unwrap_or(Value::Null),
            ColumnData::Bool(v) => v
                .get(idx)
                .copied()
                .flatten()
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            ColumnData::Undefined(_) => Value::Null,
        }
    }
}

/// `nulls` leading nulls followed by one value.
fn with_last<T: Clone>(nulls: usize, value: T) -> Vec<Option<T>> {
    let mut v = vec![None; nulls];
    v.push(Some(value));
    v
}

/// 2^63, the first whole f64 outside the i64 range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Whole numbers go back to disk as JSON integers.
///
/// Past 2^53 an f64 no longer holds every integer, so such values are
/// already rounded by the time they get here. They are still written
/// without a fractional part. Validation keeps new integers inside 2^53.
fn f64_to_json(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < I64_BOUND {
        Value::Number((v as i64).into())
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// A named column of the in-memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(id: impl Into<String>, data: ColumnData) -> Self {
        Self { id: id.into(), data }
    }
}
