//! Category and child category management

use std::sync::Arc;

use chrono::Utc;
use shared::{
    Action, Actor, AuditAction, AuditEvent, Category, CategoryInput, CategorySummary,
    ChildCategory, ChildCategoryInput, Resource,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditSink;

const MODULE: &str = "categories";

const CATEGORY_COLUMNS: &str = "id, name, sort_order, created_by, created_at, updated_at";
const CHILD_COLUMNS: &str = "id, category_id, name, sort_order, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
}

impl CategoryService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    async fn log(&self, actor: &Actor, action: AuditAction, description: String) {
        self.audit
            .record(AuditEvent::by(actor, action, MODULE, description))
            .await;
    }

    /// Ordered by sort order (unset last), then name.
    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<CategorySummary>> {
        actor.authorize(Resource::Category, Action::View)?;

        let categories = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT c.id, c.name, c.sort_order, c.created_at,
                   (SELECT COUNT(*) FROM child_categories cc WHERE cc.category_id = c.id) AS child_categories_count
            FROM categories c
            ORDER BY c.sort_order NULLS LAST, c.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(category)
    }

    pub async fn create(&self, actor: &Actor, input: CategoryInput) -> AppResult<Category> {
        actor.authorize(Resource::Category, Action::Create)?;
        input.validate()?;

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, name, sort_order, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.sort_order)
        .bind(actor.user_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(category_id = %category.id, "Category created");
        self.log(
            actor,
            AuditAction::Created,
            format!("Created category: {} (ID: {})", category.name, category.id),
        )
        .await;

        Ok(category)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: CategoryInput) -> AppResult<Category> {
        actor.authorize(Resource::Category, Action::Edit)?;
        input.validate()?;

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET name = $2, sort_order = $3, updated_at = $4
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.sort_order)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        self.log(
            actor,
            AuditAction::Updated,
            format!("Updated category: {} (ID: {})", category.name, category.id),
        )
        .await;

        Ok(category)
    }

    /// Child categories go with their parent.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.authorize(Resource::Category, Action::Delete)?;

        let category = self
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        let in_use: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if in_use {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: "Category is still used by products".to_string(),
            });
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        self.log(
            actor,
            AuditAction::Deleted,
            format!("Deleted category: {} (ID: {})", category.name, category.id),
        )
        .await;

        Ok(())
    }

    pub async fn children(&self, actor: &Actor, category_id: Uuid) -> AppResult<Vec<ChildCategory>> {
        actor.authorize(Resource::Category, Action::View)?;

        let children = sqlx::query_as::<_, ChildCategory>(&format!(
            r#"
            SELECT {CHILD_COLUMNS} FROM child_categories
            WHERE category_id = $1
            ORDER BY sort_order NULLS LAST, name
            "#
        ))
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(children)
    }

    pub async fn find_child(&self, id: Uuid) -> AppResult<Option<ChildCategory>> {
        let child = sqlx::query_as::<_, ChildCategory>(&format!(
            "SELECT {CHILD_COLUMNS} FROM child_categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(child)
    }

    async fn ensure_category(&self, category_id: Uuid) -> AppResult<()> {
        if self.find(category_id).await?.is_none() {
            return Err(AppError::validation(
                "category_id",
                "The selected category does not exist",
            ));
        }
        Ok(())
    }

    pub async fn create_child(&self, actor: &Actor, input: ChildCategoryInput) -> AppResult<ChildCategory> {
        actor.authorize(Resource::Category, Action::Create)?;
        input.validate()?;
        self.ensure_category(input.category_id).await?;

        let child = sqlx::query_as::<_, ChildCategory>(&format!(
            r#"
            INSERT INTO child_categories (id, category_id, name, sort_order, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {CHILD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(input.sort_order)
        .bind(actor.user_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        self.log(
            actor,
            AuditAction::Created,
            format!("Created child category: {} (ID: {})", child.name, child.id),
        )
        .await;

        Ok(child)
    }

    pub async fn update_child(&self, actor: &Actor, id: Uuid, input: ChildCategoryInput) -> AppResult<ChildCategory> {
        actor.authorize(Resource::Category, Action::Edit)?;
        input.validate()?;
        self.ensure_category(input.category_id).await?;

        let child = sqlx::query_as::<_, ChildCategory>(&format!(
            r#"
            UPDATE child_categories SET category_id = $2, name = $3, sort_order = $4, updated_at = $5
            WHERE id = $1
            RETURNING {CHILD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(input.sort_order)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Child category".to_string()))?;

        self.log(
            actor,
            AuditAction::Updated,
            format!("Updated child category: {} (ID: {})", child.name, child.id),
        )
        .await;

        Ok(child)
    }

    pub async fn delete_child(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.authorize(Resource::Category, Action::Delete)?;

        let child = self
            .find_child(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Child category".to_string()))?;

        sqlx::query("DELETE FROM child_categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        self.log(
            actor,
            AuditAction::Deleted,
            format!("Deleted child category: {} (ID: {})", child.name, child.id),
        )
        .await;

        Ok(())
    }
}
