use thiserror::Error;

use crate::auth::PasswordError;
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::table::schema::SchemaError;
use crate::table::validate::ValidationError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("{0}")]
    NotFound(String),

    #[error("field {field} does not exist in table {table}")]
    OrderField { field: String, table: String },

    #[error("column {column} does not exist in table {table}")]
    UnknownColumn { column: String, table: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Invalid table name: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}
