//! Audit trail models

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Actor, Role};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Login,
    StockIn,
    StockOut,
    Error,
}

impl AuditAction {
    pub const ALL: [AuditAction; 7] = [
        AuditAction::Created,
        AuditAction::Updated,
        AuditAction::Deleted,
        AuditAction::Login,
        AuditAction::StockIn,
        AuditAction::StockOut,
        AuditAction::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Deleted => "deleted",
            AuditAction::Login => "login",
            AuditAction::StockIn => "stock_in",
            AuditAction::StockOut => "stock_out",
            AuditAction::Error => "error",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modules that appear in the audit trail
pub const AUDIT_MODULES: [&str; 9] = [
    "products",
    "brands",
    "categories",
    "stock_in",
    "stock_out",
    "users",
    "reports",
    "settings",
    "system",
];

/// An audit entry about to be written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub module: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEvent {
    pub fn by(actor: &Actor, action: AuditAction, module: &str, description: impl Into<String>) -> Self {
        Self {
            user_id: Some(actor.user_id),
            action,
            module: module.to_string(),
            description: description.into(),
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
        }
    }

    /// Event with no authenticated user, e.g. a server failure before login.
    pub fn anonymous(action: AuditAction, module: &str, description: impl Into<String>) -> Self {
        Self {
            user_id: None,
            action,
            module: module.to_string(),
            description: description.into(),
            ip_address: None,
            user_agent: None,
        }
    }
}

/// A stored audit entry joined with its user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_role: Option<Role>,
    pub action: AuditAction,
    pub module: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub module: Option<String>,
    /// Substring match on the client address
    pub ip_address: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Free text over description and address
    pub search: Option<String>,
}

/// Company-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanySettings {
    pub company_name: String,
}

pub const DEFAULT_COMPANY_NAME: &str = "pamela-inventory";

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CompanySettingsInput {
    #[validate(length(min = 1, max = 255, message = "Company name is required (max 255 characters)"))]
    pub company_name: String,
}
