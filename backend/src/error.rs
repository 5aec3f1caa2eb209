//! Error handling for the inventory server
//!
//! Every failure leaves the server as `{ "error": { code, message, field?, details? } }`.
//! Database and internal errors are logged but never echoed to the client.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::DomainError;
use thiserror::Error;

/// Message shown for any unexpected failure
pub const SYSTEM_ERROR_MESSAGE: &str =
    "Something went wrong with the system. Please contact your developer.";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Validation failed")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business rule errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    // Export errors
    #[error("Export failed: {0}")]
    Export(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateEntry(_) | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Export(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => AppError::Validation { field, message },
            DomainError::Forbidden { .. } => AppError::Forbidden(err.to_string()),
            DomainError::InsufficientStock { .. } => AppError::InsufficientStock(err.to_string()),
            DomainError::UnknownReportTab(tab) => {
                AppError::validation("tab", format!("Unknown report tab: {}", tab))
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Per-field messages for multi-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid", field))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::InvalidCredentials => {
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid username or password")
            }
            AppError::TokenExpired => ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            AppError::InvalidToken => ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            AppError::Unauthorized(msg) => ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(_) => {
                ErrorDetail::new("FORBIDDEN", "You are not allowed to perform this action.")
            }
            AppError::Validation { field, message } => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
            },
            AppError::InvalidInput(errors) => {
                let details = field_messages(errors);
                let (field, message) = details
                    .iter()
                    .next()
                    .map(|(f, m)| (Some(f.clone()), m.first().cloned().unwrap_or_default()))
                    .unwrap_or((None, "The given data was invalid".to_string()));
                ErrorDetail {
                    field,
                    details: Some(details),
                    ..ErrorDetail::new("VALIDATION_ERROR", message)
                }
            }
            AppError::DuplicateEntry(field) => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                )
            },
            AppError::Conflict { resource, message } => ErrorDetail {
                field: Some(resource.clone()),
                ..ErrorDetail::new("CONFLICT", message.clone())
            },
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::InsufficientStock(msg) => ErrorDetail::new("INSUFFICIENT_STOCK", msg.clone()),
            AppError::Export(_) => ErrorDetail::new("EXPORT_ERROR", SYSTEM_ERROR_MESSAGE),
            AppError::DatabaseError(_) => ErrorDetail::new("DATABASE_ERROR", SYSTEM_ERROR_MESSAGE),
            AppError::Internal(_) | AppError::InternalError(_) => {
                ErrorDetail::new("INTERNAL_ERROR", SYSTEM_ERROR_MESSAGE)
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let mut response = (status, Json(ErrorResponse { error: detail })).into_response();
        if status.is_server_error() {
            // Picked up by the error-recording middleware for the audit trail.
            response.extensions_mut().insert(ServerFailure(self.to_string()));
        }
        response
    }
}

/// Internal description of a 5xx failure, carried on the response extensions.
#[derive(Debug, Clone)]
pub struct ServerFailure(pub String);

/// Map a unique-constraint violation to `DuplicateEntry(field)`.
pub fn unique_violation(err: sqlx::Error, field: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::DuplicateEntry(field.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let forbidden: AppError = DomainError::Forbidden {
            role: "cashier".into(),
            resource: "stock_out".into(),
            action: "delete".into(),
        }
        .into();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let stock: AppError = DomainError::InsufficientStock {
            product_id: Uuid::new_v4(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(stock.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let tab: AppError = DomainError::UnknownReportTab("weekly".into()).into();
        assert!(matches!(tab, AppError::Validation { ref field, .. } if field == "tab"));
    }

    #[test]
    fn test_server_errors_carry_failure_marker() {
        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ServerFailure>().is_some());

        let response = AppError::NotFound("Brand".into()).into_response();
        assert!(response.extensions().get::<ServerFailure>().is_none());
    }
}
