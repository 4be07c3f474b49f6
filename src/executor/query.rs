//! Filter, sort and pagination over a loaded table.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::eval::{matches_filter, sort_order};
use crate::storage::Row;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Lt,
    /// Substring match; only strings ever match.
    Contains,
}

/// A single predicate on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub col: String,
    pub op: FilterOp,
    pub val: Value,
}

impl Filter {
    pub fn new(col: impl Into<String>, op: FilterOp, val: impl Into<Value>) -> Self {
        Self {
            col: col.into(),
            op,
            val: val.into(),
        }
    }
}

/// Single-column sort, ascending unless `desc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub col: String,
    #[serde(default)]
    pub desc: bool,
}

impl Sort {
    pub fn asc(col: impl Into<String>) -> Self {
        Self { col: col.into(), desc: false }
    }

    pub fn desc(col: impl Into<String>) -> Self {
        Self { col: col.into(), desc: true }
    }
}

/// Options for a table query.
///
/// Every part is optional. Without a limit, the database's configured
/// default page size applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Apply filter, then sort, then offset and limit.
///
/// Without a sort the input order is kept. The sort is stable; nulls come
/// first ascending and last descending.
pub fn run_query(rows: Vec<Row>, options: &QueryOptions, default_limit: usize) -> Vec<Row> {
    let mut rows: Vec<Row> = match &options.filter {
        Some(filter) => rows
            .into_iter()
            .filter(|row| matches_filter(filter, row.get(&filter.col)))
            .collect(),
        None => rows,
    };

    if let Some(sort) = &options.sort {
        let col = sort.col.as_str();
        if sort.desc {
            rows.sort_by(|a, b| sort_order(b.get(col), a.get(col)));
        } else {
            rows.sort_by(|a, b| sort_order(a.get(col), b.get(col)));
        }
    }

    let offset = options.offset.unwrap_or(0);
    let limit = options.limit.unwrap_or(default_limit);
    rows.into_iter().skip(offset).take(limit).collect()
}
