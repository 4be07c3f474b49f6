//! core identifier types for the storage layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated table identifier.
///
/// Table ids become file names, so they are restricted to keep every
/// table inside the storage root.
///
/// Valid ids:
/// - 1-128 characters
/// - ASCII alphanumerics, underscores, hyphens only
/// - Must not start with a hyphen
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableId(String);

impl TableId {
    const MAX_LEN: usize = 128;

    /// create a new TableId, validating the input
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidNameError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), InvalidNameError> {
        let Some(first_char) = id.chars().next() else {
            return Err(InvalidNameError::Empty);
        };

        if id.len() > Self::MAX_LEN {
            return Err(InvalidNameError::TooLong(id.len()));
        }

        if first_char == '-' {
            return Err(InvalidNameError::InvalidStart(first_char));
        }

        for (i, c) in id.chars().enumerate() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        Ok(())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TableId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableId {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TableId {
    type Error = InvalidNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableId> for String {
    fn from(id: TableId) -> Self {
        id.0
    }
}

/// generate a fresh row identifier (lowercase ULID, 26 chars)
pub fn new_row_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// generate a short column identifier from the random half of a ULID
///
/// Column ids are never derived from the display name.
pub fn new_column_id() -> String {
    let ulid = ulid::Ulid::new().to_string().to_lowercase();
    ulid[ulid.len() - 10..].to_string()
}

/// error type for invalid identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidCharacter { char: char, position: usize },
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "id cannot be empty"),
            Self::TooLong(len) => write!(f, "id too long: {} characters", len),
            Self::InvalidStart(c) => write!(f, "id cannot start with '{}'", c),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
        }
    }
}

impl std::error::Error for InvalidNameError {}
