//! Audit log handlers (administrators only)

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{AuditAction, AuditLog, AuditLogFilter, Pagination, Rows};
use uuid::Uuid;

use super::parse_date;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AuditService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub module: Option<String>,
    pub ip_address: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    /// `false` returns every matching log
    pub paginate: Option<bool>,
}

impl AuditQuery {
    fn filter(&self) -> AuditLogFilter {
        AuditLogFilter {
            user_id: self.user_id,
            action: self.action,
            module: self.module.clone(),
            ip_address: self.ip_address.clone(),
            date_from: parse_date(self.date_from.as_deref()),
            date_to: parse_date(self.date_to.as_deref()),
            search: self.search.clone(),
        }
    }
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Rows<AuditLog>>> {
    let pagination = match query.paginate {
        Some(false) => None,
        _ => Some(Pagination::new(query.page, state.config.inventory.audit_page_size)),
    };
    let logs = AuditService::new(state.db.clone())
        .list(&actor, &query.filter(), pagination)
        .await?;
    Ok(Json(logs))
}

pub async fn export_audit_logs(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Response> {
    let csv = AuditService::new(state.db.clone())
        .export_csv(&actor, &query.filter())
        .await?;
    let disposition = format!(
        "attachment; filename=\"audit_logs_{}.csv\"",
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
