//! Predicate evaluation over JSON cell values.

use std::cmp::Ordering;

use serde_json::Value;

use super::query::{Filter, FilterOp};

/// Evaluate a single filter against a cell. An absent cell is read as null.
pub fn matches_filter(filter: &Filter, cell: Option<&Value>) -> bool {
    let cell = cell.unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::Eq => values_equal(cell, &filter.val),
        FilterOp::Neq => !values_equal(cell, &filter.val),
        FilterOp::Gt => compare_values(cell, &filter.val) == Some(Ordering::Greater),
        FilterOp::Lt => compare_values(cell, &filter.val) == Some(Ordering::Less),
        FilterOp::Contains => match (cell, &filter.val) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
    }
}

/// Equality between JSON values; numbers compare numerically.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map(|(x, y)| x == y)
            .unwrap_or(false),
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

/// Order two values of the same kind. Different kinds (and nulls) are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used for sorting. Absent and null sort first.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => compare_values(a, b).unwrap_or_else(|| kind_rank(a).cmp(&kind_rank(b))),
    }
}

// keeps mixed-kind columns deterministic
fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
