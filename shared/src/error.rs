//! Domain-level failures raised by the pure rules in this crate

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Role {role} may not {action} {resource}")]
    Forbidden {
        role: String,
        resource: String,
        action: String,
    },

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("Unknown report tab: {0}")]
    UnknownReportTab(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
