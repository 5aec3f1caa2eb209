//! Brand management

use std::sync::Arc;

use chrono::Utc;
use shared::{validation, Action, Actor, AuditAction, AuditEvent, Brand, BrandInput, Resource};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{unique_violation, AppError, AppResult};
use crate::services::audit::AuditSink;
use crate::store::postgres::like_pattern;

const MODULE: &str = "brands";

#[derive(Clone)]
pub struct BrandService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
}

impl BrandService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    pub async fn list(&self, actor: &Actor, search: Option<&str>) -> AppResult<Vec<Brand>> {
        actor.authorize(Resource::Brand, Action::View)?;

        let brands = match validation::normalize_search(search) {
            Some(q) => {
                sqlx::query_as::<_, Brand>(
                    "SELECT id, name, created_by, created_at, updated_at FROM brands WHERE name ILIKE $1 ORDER BY name",
                )
                .bind(like_pattern(&q))
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Brand>(
                    "SELECT id, name, created_by, created_at, updated_at FROM brands ORDER BY name",
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(brands)
    }

    pub async fn create(&self, actor: &Actor, input: BrandInput) -> AppResult<Brand> {
        actor.authorize(Resource::Brand, Action::Create)?;
        input.validate()?;

        let now = Utc::now();
        let brand = sqlx::query_as::<_, Brand>(
            r#"
            INSERT INTO brands (id, name, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(actor.user_id)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_violation(e, "name"))?;

        tracing::info!(brand_id = %brand.id, "Brand created");
        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Created,
                MODULE,
                format!("Created brand: {} (ID: {})", brand.name, brand.id),
            ))
            .await;

        Ok(brand)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: BrandInput) -> AppResult<Brand> {
        actor.authorize(Resource::Brand, Action::Edit)?;
        input.validate()?;

        let brand = sqlx::query_as::<_, Brand>(
            r#"
            UPDATE brands SET name = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, name, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| unique_violation(e, "name"))?
        .ok_or_else(|| AppError::NotFound("Brand".to_string()))?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Updated,
                MODULE,
                format!("Updated brand: {} (ID: {})", brand.name, brand.id),
            ))
            .await;

        Ok(brand)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.authorize(Resource::Brand, Action::Delete)?;

        let name: String = sqlx::query_scalar("SELECT name FROM brands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand".to_string()))?;

        let in_use: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE brand_id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if in_use {
            return Err(AppError::Conflict {
                resource: "brand".to_string(),
                message: "Brand is still used by products".to_string(),
            });
        }

        sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Deleted,
                MODULE,
                format!("Deleted brand: {} (ID: {})", name, id),
            ))
            .await;

        Ok(())
    }
}
