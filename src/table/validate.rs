use thiserror::Error;
use tracing::warn;

use crate::filter::FieldUpdate;
use crate::table::schema::{SchemaField, TableSchema};
use crate::types::Record;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field {field} doesn't exist in schema")]
    UnknownField { field: String },

    #[error("field {field} ({expected}): {reason}")]
    TypeMismatch { field: String, expected: String, reason: String },

    #[error("missing required field {field}")]
    MissingField { field: String },

    #[error("no updates supplied")]
    EmptyUpdates,
}

impl ValidationError {
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::UnknownField { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::MissingField { field } => Some(field),
            ValidationError::EmptyUpdates => None,
        }
    }
}

/// Check a candidate record for creation. Every supplied field must be in the
/// schema and fit its type; every schema field must be supplied.
pub fn validate_record(schema: &TableSchema, record: &Record) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, value) in record {
        match schema.get(name) {
            Some(field) => errors.extend(check_value(name, field, value)),
            None => errors.push(ValidationError::UnknownField { field: name.clone() }),
        }
    }

    for (name, _) in schema.fields() {
        if !record.contains_key(name) {
            errors.push(ValidationError::MissingField { field: name.clone() });
        }
    }

    log_failures(schema.table(), &errors);
    errors
}

/// Check a partial update. An empty update list fails outright.
pub fn validate_updates(schema: &TableSchema, updates: &[FieldUpdate]) -> Vec<ValidationError> {
    if updates.is_empty() {
        let errors = vec![ValidationError::EmptyUpdates];
        log_failures(schema.table(), &errors);
        return errors;
    }

    let mut errors = Vec::new();
    for update in updates {
        match schema.get(&update.field) {
            Some(field) => errors.extend(check_value(&update.field, field, &update.value)),
            None => errors.push(ValidationError::UnknownField { field: update.field.clone() }),
        }
    }

    log_failures(schema.table(), &errors);
    errors
}

fn check_value(name: &str, field: &SchemaField, value: &Value) -> Option<ValidationError> {
    if value.is_null() && field.nullable {
        return None;
    }
    field.column_type.check(value).err().map(|reason| ValidationError::TypeMismatch {
        field: name.to_string(),
        expected: field.declared.clone(),
        reason,
    })
}

fn log_failures(table: &str, errors: &[ValidationError]) {
    if errors.is_empty() {
        return;
    }
    warn!(
        table,
        "{} validation error{} found: {}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::schema::ColumnDescription;
    use serde_json::json;

    fn users() -> TableSchema {
        let col = |name: &str, ty: &str, nullable: bool| ColumnDescription {
            name: name.into(),
            column_type: ty.into(),
            nullable,
            default: None,
            key: String::new(),
            extra: String::new(),
        };
        TableSchema::from_columns(
            "users",
            vec![
                col("email", "varchar(255)", false),
                col("age", "int(11)", false),
                col("nickname", "varchar(20)", true),
            ],
        )
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_a_complete_record() {
        let errors = validate_record(&users(), &record(json!({"email": "a@b.c", "age": "41", "nickname": null})));
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn reports_oversized_values_by_field() {
        let errors = validate_record(
            &users(),
            &record(json!({"email": "x".repeat(300), "age": 1, "nickname": "n"})),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), Some("email"));
        assert!(matches!(&errors[0], ValidationError::TypeMismatch { expected, .. } if expected == "varchar(255)"));
    }

    #[test]
    fn reports_missing_and_unknown_fields() {
        let errors = validate_record(&users(), &record(json!({"email": "a@b.c", "favourite_colour": "red"})));
        assert!(errors.contains(&ValidationError::UnknownField { field: "favourite_colour".into() }));
        assert!(errors.contains(&ValidationError::MissingField { field: "age".into() }));
        assert!(errors.contains(&ValidationError::MissingField { field: "nickname".into() }));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn null_only_allowed_for_nullable_fields() {
        let errors = validate_record(&users(), &record(json!({"email": null, "age": 1, "nickname": null})));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), Some("email"));
    }

    #[test]
    fn empty_updates_fail() {
        assert_eq!(validate_updates(&users(), &[]), vec![ValidationError::EmptyUpdates]);
    }

    #[test]
    fn updates_must_name_schema_fields_and_fit_types() {
        let schema = users();
        assert!(validate_updates(&schema, &[FieldUpdate::new("age", 30)]).is_empty());

        let errors = validate_updates(
            &schema,
            &[FieldUpdate::new("age", "old"), FieldUpdate::new("nonexistent_field_typo", "x")],
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field(), Some("age"));
        assert_eq!(errors[1], ValidationError::UnknownField { field: "nonexistent_field_typo".into() });
    }
}
