//! Company settings stored as key/value rows

use std::sync::Arc;

use chrono::Utc;
use shared::{Action, Actor, AuditAction, AuditEvent, CompanySettings, CompanySettingsInput, Resource};
use sqlx::PgPool;
use validator::Validate;

use crate::error::AppResult;
use crate::services::audit::AuditSink;

const COMPANY_NAME_KEY: &str = "company_name";

#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
}

impl SettingsService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Falls back to the default company name when nothing is stored.
    pub async fn get(&self) -> AppResult<CompanySettings> {
        let name: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(COMPANY_NAME_KEY)
            .fetch_optional(&self.db)
            .await?;

        Ok(match name {
            Some(company_name) if !company_name.trim().is_empty() => CompanySettings { company_name },
            _ => CompanySettings::default(),
        })
    }

    pub async fn show(&self, actor: &Actor) -> AppResult<CompanySettings> {
        actor.authorize(Resource::Settings, Action::View)?;
        self.get().await
    }

    pub async fn update(&self, actor: &Actor, input: CompanySettingsInput) -> AppResult<CompanySettings> {
        actor.authorize(Resource::Settings, Action::Edit)?;
        input.validate()?;

        let before = self.get().await?;
        let after = CompanySettings {
            company_name: input.company_name.trim().to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(COMPANY_NAME_KEY)
        .bind(&after.company_name)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        tracing::info!(company_name = %after.company_name, "Company settings updated");
        let description = serde_json::json!({ "before": before, "after": after }).to_string();
        self.audit
            .record(AuditEvent::by(actor, AuditAction::Updated, "settings", description))
            .await;

        Ok(after)
    }
}
