use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::fmt;

use crate::services::snapshot_builder::SnapshotError;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    ConfigError(String),
    InternalError(String),
    Validation { field: String, message: String },
    Snapshot(SnapshotError),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable error kind reported to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Snapshot(SnapshotError::ProductNotFound(_)) => "not_found",
            AppError::Snapshot(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "authentication_error",
            AppError::Forbidden(_) => "authorization_error",
            AppError::DatabaseError(_) => "persistence_error",
            AppError::ConfigError(_) | AppError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Snapshot(SnapshotError::ProductNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Snapshot(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation { field, message } => {
                write!(f, "Validation failed for {}: {}", field, message)
            }
            AppError::Snapshot(e) => write!(f, "{}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(sqlx::Error::Migrate(Box::new(err)))
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        AppError::Snapshot(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = Map::new();
        body.insert("kind".to_string(), json!(self.kind()));

        let message = match self {
            AppError::DatabaseError(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Storage is currently unavailable".to_string()
            }
            AppError::ConfigError(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                "Server configuration error".to_string()
            }
            AppError::InternalError(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Validation {
                ref field,
                ref message,
            } => {
                body.insert("field".to_string(), json!(field));
                message.clone()
            }
            AppError::Snapshot(ref e) => {
                body.insert("code".to_string(), json!(e.code()));
                if let Some(field) = e.field() {
                    body.insert("field".to_string(), json!(field));
                }
                e.to_string()
            }
            AppError::NotFound(ref msg)
            | AppError::Unauthorized(ref msg)
            | AppError::Forbidden(ref msg) => msg.clone(),
        };

        body.insert("message".to_string(), json!(message));

        (status, Json(Value::Object(body))).into_response()
    }
}
