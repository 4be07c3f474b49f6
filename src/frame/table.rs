//! Column-oriented working copy of a table.

use super::column::{Column, ColumnData};
use super::error::{FrameError, FrameResult};
use crate::storage::Row;

/// A table held column by column.
///
/// Every column has exactly `height` values of one concrete type. A
/// `Frame` only exists for the duration of a mutation; at rest a table is
/// a list of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame from rows, inferring one type per column.
    ///
    /// Columns appear in the order their keys are first seen. A row that
    /// lacks a key contributes a null to that column.
    pub fn from_rows(rows: &[Row]) -> FrameResult<Self> {
        let mut ids: Vec<&str> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !ids.contains(&key.as_str()) {
                    ids.push(key.as_str());
                }
            }
        }

        let columns = ids
            .into_iter()
            .map(|id| {
                let data = ColumnData::from_values(id, rows.iter().map(|r| r.get(id)))?;
                Ok(Column::new(id, data))
            })
            .collect::<FrameResult<Vec<_>>>()?;

        Ok(Self {
            columns,
            height: rows.len(),
        })
    }

    /// Materialize rows, keys in column order. Nulls are written explicitly.
    pub fn to_rows(&self) -> Vec<Row> {
        (0..self.height).map(|i| self.row(i)).collect()
    }

    /// Materialize a single row. Past the last row every cell reads as null.
    pub fn row(&self, index: usize) -> Row {
        self.columns
            .iter()
            .map(|c| (c.id.clone(), c.data.get(index)))
            .collect()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// No rows or no columns: nothing to reconcile.
    ///
    /// Rows without columns still count towards `height`.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_ids(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Assemble a frame from columns that must all share one length.
    pub fn from_columns(columns: Vec<Column>) -> FrameResult<Self> {
        let height = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != height {
                return Err(FrameError::LengthMismatch {
                    column: col.id.clone(),
                    expected: height,
                    found: col.data.len(),
                });
            }
            if columns[..i].iter().any(|c| c.id == col.id) {
                return Err(FrameError::DuplicateColumn(col.id.clone()));
            }
        }
        Ok(Self { columns, height })
    }

    /// Columns already known to be `height` long with distinct ids.
    pub(super) fn from_parts(columns: Vec<Column>, height: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.data.len() == height));
        Self { columns, height }
    }

    /// Append `other` below `self`.
    ///
    /// Both frames must have the same column ids in the same order, and
    /// each column pair the same concrete type. Nothing is coerced.
    pub fn vstack(mut self, other: Frame) -> FrameResult<Frame> {
        let same_layout = self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(l, r)| l.id == r.id);
        if !same_layout {
            return Err(FrameError::ShapeMismatch {
                left: self.column_ids(),
                right: other.column_ids(),
            });
        }

        let added = other.height;
        for (left, right) in self.columns.iter_mut().zip(other.columns) {
            left.data.extend(&left.id, right.data)?;
        }
        self.height += added;
        Ok(self)
    }
}
