//! Audit trail: recording events and browsing them
//!
//! Recording is best-effort. A failed write is logged and swallowed so it can
//! never undo the change that triggered it.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared::{Action, Actor, AuditEvent, AuditLog, AuditLogFilter, Pagination, Resource, Rows};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::postgres::like_pattern;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Writes audit events to the `audit_logs` table
#[derive(Clone)]
pub struct PgAuditSink {
    db: PgPool,
}

impl PgAuditSink {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, module, description, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(event.action)
        .bind(&event.module)
        .bind(&event.description)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(Utc::now())
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!(action = %event.action, module = %event.module, error = %e, "Failed to write audit log");
        }
    }
}

/// Collects events in memory; used by tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(_) => tracing::warn!("Audit buffer lock poisoned; event dropped"),
        }
    }
}

pub const AUDIT_CSV_HEADERS: [&str; 8] = [
    "Date",
    "User",
    "Role",
    "Action",
    "Module",
    "Description",
    "IP Address",
    "User Agent",
];

/// Audit log browsing and export
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AuditLogFilter) {
        if let Some(user_id) = filter.user_id {
            qb.push(" AND a.user_id = ").push_bind(user_id);
        }
        if let Some(action) = filter.action {
            qb.push(" AND a.action = ").push_bind(action);
        }
        if let Some(module) = shared::validation::normalize_search(filter.module.as_deref()) {
            qb.push(" AND a.module = ").push_bind(module);
        }
        if let Some(ip) = shared::validation::normalize_search(filter.ip_address.as_deref()) {
            qb.push(" AND a.ip_address ILIKE ").push_bind(like_pattern(&ip));
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND (a.created_at AT TIME ZONE 'UTC')::DATE >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND (a.created_at AT TIME ZONE 'UTC')::DATE <= ").push_bind(to);
        }
        if let Some(search) = shared::validation::normalize_search(filter.search.as_deref()) {
            let pattern = like_pattern(&search);
            qb.push(" AND (a.description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.ip_address ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    const SELECT: &'static str = r#"
        SELECT a.id, a.user_id, u.name AS user_name, u.role AS user_role, a.action, a.module,
               a.description, a.ip_address, a.user_agent, a.created_at
        FROM audit_logs a
        LEFT JOIN users u ON u.id = a.user_id
        WHERE TRUE
    "#;

    /// Newest first; one page when `pagination` is given, otherwise everything.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &AuditLogFilter,
        pagination: Option<Pagination>,
    ) -> AppResult<Rows<AuditLog>> {
        actor.authorize(Resource::AuditLog, Action::View)?;
        self.fetch(filter, pagination).await
    }

    async fn fetch(&self, filter: &AuditLogFilter, pagination: Option<Pagination>) -> AppResult<Rows<AuditLog>> {
        let mut qb = QueryBuilder::<Postgres>::new(Self::SELECT);
        Self::push_filters(&mut qb, filter);
        qb.push(" ORDER BY a.created_at DESC, a.id");

        let Some(page) = pagination else {
            let logs = qb.build_query_as::<AuditLog>().fetch_all(&self.db).await?;
            return Ok(Rows::All(logs));
        };

        qb.push(" LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let logs = qb.build_query_as::<AuditLog>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM audit_logs a LEFT JOIN users u ON u.id = a.user_id WHERE TRUE",
        );
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok(Rows::Paged(shared::PaginatedResponse::from_page(
            logs,
            page,
            total.max(0) as u64,
        )))
    }

    /// CSV of every log matching `filter`.
    pub async fn export_csv(&self, actor: &Actor, filter: &AuditLogFilter) -> AppResult<String> {
        actor.authorize(Resource::AuditLog, Action::Export)?;

        let logs = match self.fetch(filter, None).await? {
            Rows::All(logs) => logs,
            Rows::Paged(page) => page.data,
        };
        render_audit_csv(&logs)
    }
}

pub fn render_audit_csv(logs: &[AuditLog]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(AUDIT_CSV_HEADERS)
        .map_err(|e| AppError::Export(e.to_string()))?;

    for log in logs {
        wtr.write_record([
            log.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            log.user_name.clone().unwrap_or_else(|| "System".to_string()),
            log.user_role.map(|r| r.as_str().to_string()).unwrap_or_default(),
            log.action.as_str().to_string(),
            log.module.clone(),
            log.description.clone(),
            log.ip_address.clone().unwrap_or_default(),
            log.user_agent.clone().unwrap_or_default(),
        ])
        .map_err(|e| AppError::Export(e.to_string()))?;
    }

    let bytes = wtr.into_inner().map_err(|e| AppError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))
}
