//! Reconciling stored data with the current schema.
//!
//! A table read from disk may predate columns added since it was written,
//! and an all-null column carries no type of its own. Both must be fixed
//! before rows are stacked, or the column types will not line up.

use serde_json::Value;
use tracing::warn;

use super::column::{Column, ColumnData};
use super::error::{FrameError, FrameResult};
use super::table::Frame;
use crate::catalog::TableSchema;
use crate::storage::Row;

/// Bring a frame's columns in line with `schema`.
///
/// - an empty frame is returned unchanged
/// - schema columns missing from the frame are added as typed nulls
/// - untyped all-null columns get the schema's storage type
/// - columns are ordered as in the schema; columns unknown to the schema
///   are kept, after the schema columns
///
/// Applying it twice gives the same frame as applying it once.
pub fn align_table(frame: Frame, schema: &TableSchema) -> Frame {
    if frame.is_empty() {
        return frame;
    }

    let height = frame.height();
    let mut remaining = frame.into_columns();
    let mut aligned = Vec::with_capacity(schema.columns.len() + remaining.len());

    for def in &schema.columns {
        let storage_type = def.storage_type();
        let data = match remaining.iter().position(|c| c.id == def.id) {
            Some(pos) => remaining.remove(pos).data.cast_undefined(storage_type),
            None => ColumnData::typed_nulls(storage_type, height),
        };
        aligned.push(Column::new(def.id.clone(), data));
    }

    if !remaining.is_empty() {
        let extra: Vec<&str> = remaining.iter().map(|c| c.id.as_str()).collect();
        warn!(table = %schema.id, columns = ?extra, "stored columns not in schema, keeping them last");
    }
    aligned.extend(remaining);

    Frame::from_parts(aligned, height)
}

/// Give `frame` the exact column layout of `template`.
///
/// Used on a freshly built frame before stacking it under an existing,
/// already aligned one. Missing columns become typed nulls and untyped
/// columns take the template's type; typed columns are never coerced, so a
/// real conflict still surfaces when the frames are stacked.
pub fn align_to(frame: Frame, template: &Frame) -> Frame {
    let height = frame.height();
    let mut remaining = frame.into_columns();
    let mut aligned = Vec::with_capacity(template.width() + remaining.len());

    for target in template.columns() {
        let target_type = target.data.storage_type();
        let data = match remaining.iter().position(|c| c.id == target.id) {
            Some(pos) => {
                let data = remaining.remove(pos).data;
                match target_type {
                    Some(t) => data.cast_undefined(t),
                    None => data,
                }
            }
            None => match target_type {
                Some(t) => ColumnData::typed_nulls(t, height),
                None => ColumnData::Undefined(height),
            },
        };
        aligned.push(Column::new(target.id.clone(), data));
    }
    aligned.extend(remaining);

    Frame::from_parts(aligned, height)
}

/// Check that every typed column matching a schema column has the schema's type.
pub fn check_types(frame: &Frame, schema: &TableSchema) -> FrameResult<()> {
    for def in &schema.columns {
        let Some(column) = frame.column(&def.id) else {
            continue;
        };
        if let Some(actual) = column.data.storage_type() {
            let expected = def.storage_type();
            if actual != expected {
                return Err(FrameError::TypeMismatch {
                    column: def.id.clone(),
                    left: column.data.type_name(),
                    right: expected.name(),
                });
            }
        }
    }
    Ok(())
}

/// Give a row an explicit key for every schema column, in schema order.
///
/// Missing keys default to null. Keys unknown to the schema are kept at the end.
pub fn align_row(row: Row, schema: &TableSchema) -> Row {
    let mut rest = row.into_map();
    let mut aligned = Row::new();
    for id in schema.column_ids() {
        let value = rest.shift_remove(id).unwrap_or(Value::Null);
        aligned.insert(id, value);
    }
    for (key, value) in rest {
        aligned.insert(key, value);
    }
    aligned
}
