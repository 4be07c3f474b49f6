//! Column types, storage types and column definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Abstract column types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free text.
    Text,
    /// Any JSON number, held as a 64-bit float.
    Number,
    /// A date or timestamp, stored as the string the caller supplied.
    Date,
    /// true / false.
    Boolean,
    /// One value out of a closed set of options.
    Select,
}

impl ColumnType {
    /// The concrete column type used in the in-memory columnar table.
    pub fn storage_type(self) -> StorageType {
        storage_type_for(self)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
            ColumnType::Select => "select",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete types of the columnar representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    String,
    Float64,
    Bool,
}

impl StorageType {
    pub fn name(self) -> &'static str {
        match self {
            StorageType::String => "String",
            StorageType::Float64 => "Float64",
            StorageType::Bool => "Bool",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map an abstract column type to the storage type used for typed null-fill.
///
/// Dates and select values are plain strings at rest and in memory.
pub fn storage_type_for(column_type: ColumnType) -> StorageType {
    match column_type {
        ColumnType::Text | ColumnType::Date | ColumnType::Select => StorageType::String,
        ColumnType::Number => StorageType::Float64,
        ColumnType::Boolean => StorageType::Bool,
    }
}

/// A column as persisted in the schema.
///
/// `id` is the identity of the column and the key used in every row;
/// `name` is only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `select` columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            required: false,
            options: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn storage_type(&self) -> StorageType {
        self.column_type.storage_type()
    }

    /// Non-empty option list of a select column.
    pub fn select_options(&self) -> Option<&[String]> {
        match (&self.column_type, &self.options) {
            (ColumnType::Select, Some(opts)) if !opts.is_empty() => Some(opts),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.name, self.id, self.column_type)?;
        if self.required {
            write!(f, " required")?;
        }
        Ok(())
    }
}

/// Caller input for adding a column. The engine assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl NewColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: false,
            options: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn into_def(self, id: String) -> ColumnDef {
        ColumnDef {
            id,
            name: self.name,
            column_type: self.column_type,
            required: self.required,
            options: self.options,
        }
    }
}
