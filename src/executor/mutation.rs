//! Row transforms for insert, update and delete.
//!
//! Each transform takes the current table by value and returns the new
//! one; committing it is the caller's job.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::catalog::TableSchema;
use crate::frame::{align_row, align_table, align_to, check_types, Frame, FrameResult};
use crate::storage::{Row, CREATED_FIELD, ID_FIELD, UPDATED_FIELD};

/// Current time as an ISO 8601 UTC timestamp with millisecond precision.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A timestamp strictly after `previous`.
///
/// When the clock has not moved past `previous` (same millisecond, or a
/// clock step backwards), `previous` plus one millisecond is used.
/// Unparseable previous values are ignored.
pub fn next_timestamp(previous: Option<&Value>) -> String {
    let now = Utc::now();
    let previous = previous
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    match previous {
        Some(prev) if now <= prev => format_timestamp(prev + Duration::milliseconds(1)),
        _ => format_timestamp(now),
    }
}

/// Stamp a validated row with its system fields.
///
/// The id goes first so stored rows read naturally, but the final key
/// order is set by alignment.
pub fn stamp_new_row(clean: Row, id: String, now: &str) -> Row {
    let mut row = Row::new();
    row.insert(ID_FIELD, Value::String(id));
    row.insert(CREATED_FIELD, Value::String(now.to_string()));
    row.insert(UPDATED_FIELD, Value::String(now.to_string()));
    for (key, value) in clean.into_map() {
        row.insert(key, value);
    }
    row
}

/// Append `row` as the last row of `table`.
///
/// A table with no rows takes the new row's shape directly. Otherwise the
/// table is aligned to the schema, its column types are checked, and the
/// row is aligned to the table before stacking. Stored rows that carry no
/// columns at all cannot be stacked onto and fail with a shape mismatch.
///
/// Returns the new table and the appended row as stored.
pub fn append_row(table: Frame, row: Row, schema: &TableSchema) -> FrameResult<(Frame, Row)> {
    let row = align_row(row, schema);
    let new = Frame::from_rows(std::slice::from_ref(&row))?;

    let table = if table.height() == 0 {
        new
    } else {
        let existing = align_table(table, schema);
        check_types(&existing, schema)?;
        let new = align_to(new, &existing);
        existing.vstack(new)?
    };

    let appended = table.row(table.height() - 1);
    Ok((table, appended))
}

/// Merge `changes` into the row at `index` and rebuild the table.
///
/// `rows` must already be aligned to `schema`. Row count and order are
/// unchanged. Returns the new table and the replaced row.
pub fn replace_row(
    mut rows: Vec<Row>,
    index: usize,
    changes: Row,
    schema: &TableSchema,
) -> FrameResult<(Frame, Row)> {
    let mut updated = rows[index].clone();
    for (key, value) in changes.into_map() {
        updated.insert(key, value);
    }
    let stamp = next_timestamp(updated.get(UPDATED_FIELD));
    updated.insert(UPDATED_FIELD, Value::String(stamp));
    rows[index] = align_row(updated, schema);

    let table = align_table(Frame::from_rows(&rows)?, schema);
    check_types(&table, schema)?;

    // read back through the frame so the result matches what is stored
    let replaced = table.row(index);
    Ok((table, replaced))
}

/// Drop every row whose id is `row_id`. `None` when nothing matched.
pub fn remove_row(rows: Vec<Row>, row_id: &str) -> Option<Vec<Row>> {
    let before = rows.len();
    let kept: Vec<Row> = rows.into_iter().filter(|r| r.id() != Some(row_id)).collect();
    (kept.len() != before).then_some(kept)
}

/// Index of the row with the given id.
pub fn find_row(rows: &[Row], row_id: &str) -> Option<usize> {
    rows.iter().position(|r| r.id() == Some(row_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, NewColumn};
    use crate::frame::FrameError;
    use crate::storage::TableId;
    use serde_json::json;

    struct Fixture {
        schema: TableSchema,
        status: String,
        priority: String,
    }

    fn fixture() -> Fixture {
        let mut schema = TableSchema::new(TableId::new("tasks").unwrap(), "Tasks");
        let status = schema
            .add_column(NewColumn::new("Status", ColumnType::Select).with_options(["open", "closed"]))
            .unwrap()
            .id
            .clone();
        let priority = schema
            .add_column(NewColumn::new("Priority", ColumnType::Number))
            .unwrap()
            .id
            .clone();
        Fixture { schema, status, priority }
    }

    fn new_row(f: &Fixture, id: &str, status: &str) -> Row {
        let mut clean = Row::new();
        clean.insert(f.status.clone(), json!(status));
        stamp_new_row(clean, id.to_string(), "2024-05-01T09:30:00.000Z")
    }

    #[test]
    fn test_timestamps() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());

        let future = json!("2999-01-01T00:00:00.000Z");
        assert_eq!(next_timestamp(Some(&future)), "2999-01-01T00:00:00.001Z");

        let past = json!("2001-01-01T00:00:00.000Z");
        assert!(next_timestamp(Some(&past)) > "2001-01-01T00:00:00.000Z".to_string());
        assert!(next_timestamp(Some(&json!("not a date"))).ends_with('Z'));
    }

    #[test]
    fn test_append_to_empty_table() {
        let f = fixture();
        let (table, appended) =
            append_row(Frame::empty(), new_row(&f, "a", "open"), &f.schema).unwrap();
        assert_eq!(table.height(), 1);

        let ids: Vec<String> = f.schema.column_ids().map(String::from).collect();
        assert_eq!(table.column_ids(), ids);
        assert_eq!(table.to_rows()[0].get(&f.priority), Some(&Value::Null));
        assert_eq!(appended, table.to_rows()[0]);
    }

    #[test]
    fn test_append_keeps_order() {
        let f = fixture();
        let mut table = Frame::empty();
        for id in ["a", "b", "c"] {
            let (next, appended) = append_row(table, new_row(&f, id, "open"), &f.schema).unwrap();
            assert_eq!(appended.id(), Some(id));
            table = next;
        }
        let rows = table.to_rows();
        let ids: Vec<&str> = rows.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_append_after_schema_change() {
        let mut f = fixture();
        let (table, _) = append_row(Frame::empty(), new_row(&f, "a", "open"), &f.schema).unwrap();

        let done = f
            .schema
            .add_column(NewColumn::new("Done", ColumnType::Boolean))
            .unwrap()
            .id
            .clone();
        let mut row = new_row(&f, "b", "closed");
        row.insert(done.clone(), json!(true));

        let (table, appended) = append_row(table, row, &f.schema).unwrap();
        let rows = table.to_rows();
        assert_eq!(rows[0].get(&done), Some(&Value::Null));
        assert_eq!(rows[1].get(&done), Some(&json!(true)));
        assert_eq!(appended, rows[1]);
    }

    #[test]
    fn test_append_rejects_corrupt_table() {
        let f = fixture();
        let mut stored = new_row(&f, "a", "open");
        stored.insert(f.priority.clone(), json!("high"));
        let table = Frame::from_rows(&[stored]).unwrap();

        let mut row = new_row(&f, "b", "open");
        row.insert(f.priority.clone(), json!(1));
        let result = append_row(table, row, &f.schema);
        assert!(matches!(result, Err(FrameError::TypeMismatch { .. })));
    }

    #[test]
    fn test_append_null_into_mistyped_column() {
        let f = fixture();
        let mut stored = new_row(&f, "a", "open");
        stored.insert(f.priority.clone(), json!("high"));
        let table = Frame::from_rows(&[stored]).unwrap();

        // the new row leaves priority null, so only the stored type is wrong
        let result = append_row(table, new_row(&f, "b", "open"), &f.schema);
        assert!(matches!(
            result,
            Err(FrameError::TypeMismatch { right: "Float64", .. })
        ));
    }

    #[test]
    fn test_append_to_rows_without_columns() {
        let f = fixture();
        let table = Frame::from_rows(&[Row::new(), Row::new()]).unwrap();

        let result = append_row(table, new_row(&f, "a", "open"), &f.schema);
        assert!(matches!(result, Err(FrameError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_replace_row() {
        let f = fixture();
        let rows: Vec<Row> = ["a", "b", "c"]
            .iter()
            .map(|id| align_row(new_row(&f, id, "open"), &f.schema))
            .collect();

        let mut changes = Row::new();
        changes.insert(f.status.clone(), json!("closed"));
        let (table, replaced) = replace_row(rows, 1, changes, &f.schema).unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(replaced.id(), Some("b"));
        assert_eq!(replaced.get(&f.status), Some(&json!("closed")));
        assert_eq!(replaced.get(CREATED_FIELD), Some(&json!("2024-05-01T09:30:00.000Z")));
        assert!(replaced.get(UPDATED_FIELD).unwrap().as_str().unwrap() > "2024-05-01T09:30:00.000Z");

        let out = table.to_rows();
        assert_eq!(out[0].get(&f.status), Some(&json!("open")));
        assert_eq!(out[2].id(), Some("c"));
    }

    #[test]
    fn test_replace_row_type_conflict() {
        let f = fixture();
        let rows = vec![align_row(new_row(&f, "a", "open"), &f.schema)];
        let mut changes = Row::new();
        changes.insert(f.priority.clone(), json!("urgent"));

        let result = replace_row(rows, 0, changes, &f.schema);
        assert!(matches!(result, Err(FrameError::TypeMismatch { .. })));
    }

    #[test]
    fn test_remove_row() {
        let f = fixture();
        let rows = vec![new_row(&f, "a", "open"), new_row(&f, "b", "open")];
        assert_eq!(find_row(&rows, "b"), Some(1));

        let kept = remove_row(rows, "a").unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), Some("b"));
        assert!(remove_row(kept, "a").is_none());
    }
}
