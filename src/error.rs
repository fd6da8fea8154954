// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::table::{TableError, ValidationError};
use crate::types::Operation;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Vec<ValidationError>,
    },
    InvalidJson(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 408 Request Timeout
    RequestTimeout(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } | ApiError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::RequestTimeout(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RequestTimeout(_) => "REQUEST_TIMEOUT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Envelope body: `{success: false, message, code}` plus per-field
    /// errors for validation failures.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code(),
        });

        if let ApiError::ValidationError { field_errors, .. } = self {
            if !field_errors.is_empty() {
                body["errors"] = field_errors
                    .iter()
                    .map(|e| json!({ "field": e.field(), "message": e.to_string() }))
                    .collect();
            }
        }
        body
    }

    /// Map a table failure to its HTTP form. Database internals are logged and
    /// never reach the client.
    pub fn from_table(op: Operation, err: TableError) -> Self {
        match err {
            TableError::Validation(errors) => {
                let joined = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
                let message = match op {
                    Operation::CreateRecord => format!("Failed to validate record: {}", joined),
                    Operation::UpdateRecord => format!("Unable to update record due to {}", joined),
                    _ => format!("{} failed: {}", op, joined),
                };
                ApiError::ValidationError { message, field_errors: errors }
            }
            TableError::NotFound(msg) => ApiError::NotFound(msg),
            e @ (TableError::OrderField { .. } | TableError::UnknownColumn { .. } | TableError::InvalidIdentifier(_)) => {
                ApiError::BadRequest(format!("{} failed: {}", op, e))
            }
            TableError::Filter(e) => ApiError::from_filter(op, e),
            TableError::Database(e) => ApiError::from_database(op, e),
            TableError::Schema(e) => {
                tracing::error!(operation = %op, "Schema error: {}", e);
                ApiError::InternalServerError(format!("{} failed: table unavailable", op))
            }
            TableError::Password(e) => {
                tracing::error!(operation = %op, "Password hashing error: {}", e);
                ApiError::InternalServerError(format!("{} failed: unable to store password", op))
            }
        }
    }

    pub fn from_filter(op: Operation, err: FilterError) -> Self {
        match err {
            FilterError::JsonError(e) => ApiError::InvalidJson(format!("{} failed: {}", op, e)),
            other => ApiError::BadRequest(format!("{} failed: {}", op, other)),
        }
    }

    pub fn from_database(op: Operation, err: DatabaseError) -> Self {
        match &err {
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
                tracing::error!(operation = %op, "Database unavailable: {}", err);
                ApiError::ServiceUnavailable(format!("{} failed: database temporarily unavailable", op))
            }
            _ => {
                // Don't expose internal SQL errors to clients
                tracing::error!(operation = %op, "Database error: {}", err);
                ApiError::InternalServerError(format!("{} failed: database error", op))
            }
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

/// Attach the failing operation to a table result.
pub trait OperationContext<T> {
    fn during(self, op: Operation) -> Result<T, ApiError>;
}

impl<T> OperationContext<T> for Result<T, TableError> {
    fn during(self, op: Operation) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_table(op, e))
    }
}

impl<T> OperationContext<T> for Result<T, FilterError> {
    fn during(self, op: Operation) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_filter(op, e))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_fields() {
        let err = ApiError::from_table(
            Operation::CreateRecord,
            TableError::Validation(vec![ValidationError::MissingField { field: "email".into() }]),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
        assert_eq!(body["message"], json!("Failed to validate record: missing required field email"));
        assert_eq!(body["errors"][0]["field"], json!("email"));
    }

    #[test]
    fn order_errors_are_prefixed() {
        let err = ApiError::from_table(
            Operation::GetOrder,
            TableError::OrderField { field: "nope".into(), table: "users".into() },
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "getOrder failed: field nope does not exist in table users");
    }

    #[test]
    fn database_errors_are_generic() {
        let err = ApiError::from_table(
            Operation::DeleteRecord,
            TableError::Database(DatabaseError::QueryError("Unknown column 'secret_col'".into())),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "deleteRecord failed: database error");
        assert!(!err.to_json().to_string().contains("secret_col"));
    }

    #[test]
    fn not_found_keeps_its_message() {
        let err: Result<(), _> = Err(TableError::NotFound("No record found by id 9".into()));
        let err = err.during(Operation::GetRecord).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json(), json!({"success": false, "message": "No record found by id 9", "code": "NOT_FOUND"}));
    }
}
