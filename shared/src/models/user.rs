//! User, role and capability models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed set of roles. Capabilities are attached to the role, not stored per user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
    WarehouseManager,
    Cashier,
    WarehouseStaff,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Staff,
        Role::WarehouseManager,
        Role::Cashier,
        Role::WarehouseStaff,
    ];

    /// Roles an administrator may assign through user management.
    pub const ASSIGNABLE: [Role; 4] = [
        Role::Admin,
        Role::Staff,
        Role::WarehouseManager,
        Role::Cashier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::WarehouseManager => "warehouse_manager",
            Role::Cashier => "cashier",
            Role::WarehouseStaff => "warehouse_staff",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::WarehouseManager => "Warehouse Manager",
            Role::Cashier => "Cashier",
            Role::WarehouseStaff => "Warehouse Staff",
        }
    }

    /// Whether this role holds `action` on `resource`.
    pub fn can(&self, resource: Resource, action: Action) -> bool {
        allowed_roles(resource, action).contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation("role", format!("Unknown role: {s}")))
    }
}

/// Resources guarded by the capability table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Dashboard,
    /// The caller's own account
    Profile,
    User,
    AuditLog,
    Settings,
    Brand,
    Category,
    Product,
    StockIn,
    StockOut,
    Report,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::Profile => "profile",
            Resource::User => "users",
            Resource::AuditLog => "audit_logs",
            Resource::Settings => "settings",
            Resource::Brand => "brands",
            Resource::Category => "categories",
            Resource::Product => "products",
            Resource::StockIn => "stock_in",
            Resource::StockOut => "stock_out",
            Resource::Report => "reports",
        }
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Export,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Export => "export",
        }
    }
}

const EVERYONE: &[Role] = &Role::ALL;
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const OFFICE: &[Role] = &[Role::Admin, Role::Staff];
const RECEIVING: &[Role] = &[Role::Admin, Role::Staff, Role::WarehouseManager];
const DISPATCH: &[Role] = &[
    Role::Admin,
    Role::Staff,
    Role::WarehouseManager,
    Role::WarehouseStaff,
    Role::Cashier,
];
const DISPATCH_DELETE: &[Role] = &[
    Role::Admin,
    Role::Staff,
    Role::WarehouseManager,
    Role::WarehouseStaff,
];

/// The capability table: which roles may perform `action` on `resource`.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    match (resource, action) {
        (Resource::Dashboard, Action::View) => EVERYONE,
        (Resource::Dashboard, _) => &[],
        (Resource::Profile, Action::View | Action::Edit) => EVERYONE,
        (Resource::Profile, _) => &[],
        (Resource::User | Resource::AuditLog | Resource::Settings, _) => ADMIN_ONLY,
        (Resource::Brand | Resource::Category, _) => OFFICE,
        (Resource::Product, _) => RECEIVING,
        (Resource::Report, Action::View | Action::Export) => OFFICE,
        (Resource::Report, _) => &[],
        (Resource::StockIn, _) => RECEIVING,
        (Resource::StockOut, Action::Delete) => DISPATCH_DELETE,
        (Resource::StockOut, _) => DISPATCH,
    }
}

/// The authenticated principal behind a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(user_id: Uuid, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Attach request origin details used by the audit trail.
    pub fn with_origin(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn authorize(&self, resource: Resource, action: Action) -> Result<(), DomainError> {
        if self.role.can(resource, action) {
            Ok(())
        } else {
            Err(DomainError::Forbidden {
                role: self.role.as_str().to_string(),
                resource: resource.as_str().to_string(),
                action: action.as_str().to_string(),
            })
        }
    }

    pub fn is_cashier(&self) -> bool {
        self.role == Role::Cashier
    }
}

/// Input for creating or updating a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Username is required (max 50 characters)"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub role: Role,
    /// Required on create; leaving it empty on update keeps the current password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Self-service edit of the caller's own account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Username is required (max 50 characters)"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    /// Empty keeps the current password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl ProfileInput {
    /// Blank optional fields become `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            email: crate::validation::non_blank(self.email),
            password: crate::validation::non_blank(self.password),
            password_confirmation: crate::validation::non_blank(self.password_confirmation),
        }
    }

    /// A new password must be repeated in `password_confirmation`.
    pub fn check_confirmation(&self) -> Result<(), DomainError> {
        match &self.password {
            Some(password) if self.password_confirmation.as_ref() != Some(password) => Err(
                DomainError::validation("password", "Password confirmation does not match"),
            ),
            _ => Ok(()),
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
