//! Schema-derived row validation.

use serde_json::{Map, Value};
use tracing::debug;

use super::rules::{FieldError, FieldErrorKind, FieldRule};
use crate::catalog::{SchemaVersion, TableSchema};
use crate::storage::{Row, TableId};

/// One user column's compiled check.
#[derive(Debug, Clone)]
struct FieldSpec {
    column: String,
    name: String,
    rule: FieldRule,
    required: bool,
}

/// The compiled ruleset for one schema version.
///
/// System columns are never part of a validator; the engine stamps them.
#[derive(Debug, Clone)]
pub struct Validator {
    table: TableId,
    version: SchemaVersion,
    fields: Vec<FieldSpec>,
}

impl Validator {
    /// Build the ruleset for every non-system column of `schema`.
    pub fn build(schema: &TableSchema) -> Self {
        let fields = schema
            .user_columns()
            .map(|col| FieldSpec {
                column: col.id.clone(),
                name: col.name.clone(),
                rule: FieldRule::for_column(col),
                required: col.required,
            })
            .collect();

        Self {
            table: schema.id.clone(),
            version: schema.version,
            fields,
        }
    }

    /// The schema version this validator was built from.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    /// Validate a full row payload, collecting every field error.
    ///
    /// The clean row holds only known user columns, in schema order.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<Row, ValidationError> {
        self.run(payload, false)
    }

    /// Validate only the keys present in `payload`; absent required columns are fine.
    pub fn validate_partial(&self, payload: &Map<String, Value>) -> Result<Row, ValidationError> {
        self.run(payload, true)
    }

    fn run(&self, payload: &Map<String, Value>, partial: bool) -> Result<Row, ValidationError> {
        let mut clean = Row::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = payload.get(&field.column);
            let result = match value {
                None if partial => continue,
                None | Some(Value::Null) => {
                    if field.required {
                        Err(FieldErrorKind::Required)
                    } else {
                        Ok(())
                    }
                }
                Some(v) => field.rule.check(v),
            };

            match result {
                Ok(()) => {
                    if let Some(v) = value {
                        clean.insert(field.column.clone(), v.clone());
                    }
                }
                Err(kind) => errors.push(FieldError {
                    column: field.column.clone(),
                    name: field.name.clone(),
                    kind,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        let dropped = payload.len() - clean.len();
        if dropped > 0 {
            debug!(table = %self.table, dropped, "ignored keys that are not user columns");
        }
        Ok(clean)
    }
}

/// One or more fields failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Whether a given column id has an error.
    pub fn has_error_for(&self, column: &str) -> bool {
        self.errors.iter().any(|e| e.column == column)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, NewColumn};
    use serde_json::json;

    struct Fixture {
        schema: TableSchema,
        status: String,
        title: String,
        priority: String,
        done: String,
    }

    fn fixture() -> Fixture {
        let mut schema = TableSchema::new(TableId::new("tasks").unwrap(), "Tasks");
        let mut add = |col: NewColumn| schema.add_column(col).unwrap().id.clone();
        let status = add(
            NewColumn::new("Status", ColumnType::Select)
                .required(true)
                .with_options(["open", "closed"]),
        );
        let title = add(NewColumn::new("Title", ColumnType::Text).required(true));
        let priority = add(NewColumn::new("Priority", ColumnType::Number));
        let done = add(NewColumn::new("Done", ColumnType::Boolean));
        Fixture { schema, status, title, priority, done }
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_payload() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let mut payload = Map::new();
        payload.insert(f.title.clone(), json!("Write docs"));
        payload.insert(f.status.clone(), json!("open"));
        payload.insert(f.priority.clone(), json!(2));

        let clean = validator.validate(&payload).unwrap();
        let keys: Vec<&String> = clean.keys().collect();
        // schema order, not payload order
        assert_eq!(keys, vec![&f.status, &f.title, &f.priority]);
        assert!(!clean.contains(&f.done));
    }

    #[test]
    fn test_collects_every_missing_required() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let err = validator.validate(&Map::new()).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.has_error_for(&f.status));
        assert!(err.has_error_for(&f.title));
        assert!(err.to_string().contains("'Status' is required"));
    }

    #[test]
    fn test_mixed_errors() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let mut payload = Map::new();
        payload.insert(f.status.clone(), json!("pending"));
        payload.insert(f.title.clone(), Value::Null);
        payload.insert(f.priority.clone(), json!("high"));
        payload.insert(f.done.clone(), json!([true]));

        let err = validator.validate(&payload).unwrap_err();
        assert_eq!(err.errors.len(), 4);
        assert!(matches!(err.errors[0].kind, FieldErrorKind::InvalidOption { .. }));
        assert_eq!(err.errors[1].kind, FieldErrorKind::Required);
    }

    #[test]
    fn test_optional_null_accepted() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let mut payload = Map::new();
        payload.insert(f.status.clone(), json!("closed"));
        payload.insert(f.title.clone(), json!("x"));
        payload.insert(f.priority.clone(), Value::Null);

        let clean = validator.validate(&payload).unwrap();
        assert_eq!(clean.get(&f.priority), Some(&Value::Null));
    }

    #[test]
    fn test_unknown_and_system_keys_dropped() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let mut payload = obj(json!({"id": "forged", "_created": "yesterday", "Title": "by name"}));
        payload.insert(f.status.clone(), json!("open"));
        payload.insert(f.title.clone(), json!("by id"));

        let clean = validator.validate(&payload).unwrap();
        assert_eq!(clean.len(), 2);
        assert!(!clean.contains("id"));
        assert!(!clean.contains("Title"));
    }

    #[test]
    fn test_partial_validation() {
        let f = fixture();
        let validator = Validator::build(&f.schema);

        let mut payload = Map::new();
        payload.insert(f.priority.clone(), json!(5));
        assert_eq!(validator.validate_partial(&payload).unwrap().len(), 1);

        payload.insert(f.status.clone(), Value::Null);
        let err = validator.validate_partial(&payload).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.has_error_for(&f.status));
    }

    #[test]
    fn test_version_recorded() {
        let f = fixture();
        let validator = Validator::build(&f.schema);
        assert_eq!(validator.version(), f.schema.version);
        assert_eq!(validator.table().as_str(), "tasks");
    }
}
