//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A string that cannot be used as a tenant schema identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaNameError {
    #[error("schema name is empty")]
    Empty,
    #[error("invalid schema name: {0:?}")]
    Invalid(String),
}

/// Provisioning script failure. The source error is the one raised by the
/// failing batch; rollback errors are never reported here.
#[derive(Error, Debug)]
pub enum ScriptExecutionError {
    #[error("connection: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("session setup: {0}")]
    Setup(#[source] sqlx::Error),
    #[error("batch {index} failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("commit: {0}")]
    Commit(#[source] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("template: {0}")]
    Template(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("failed to create schema ({schema}). Reason: {source}")]
    Provisioning {
        schema: String,
        #[source]
        source: ScriptExecutionError,
    },
    #[error("internal: {0}")]
    Internal(String),
}

impl From<SchemaNameError> for AppError {
    fn from(e: SchemaNameError) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Provisioning { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "provisioning_failed"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_name_errors_map_to_validation() {
        let err: AppError = SchemaNameError::Invalid("a b".into()).into();
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn provisioning_error_keeps_underlying_reason() {
        let err = AppError::Provisioning {
            schema: "tenant_42".into(),
            source: ScriptExecutionError::Batch {
                index: 2,
                source: sqlx::Error::RowNotFound,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("tenant_42"));
        assert!(msg.contains("batch 2 failed"));
        assert_eq!(err.status_and_code().1, "provisioning_failed");
    }

    #[test]
    fn row_not_found_is_404() {
        let err = AppError::Db(sqlx::Error::RowNotFound);
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }
}
