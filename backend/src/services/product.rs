//! Product catalog management

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    validation, Action, Actor, AuditAction, AuditEvent, PaginatedResponse, Pagination, Product,
    ProductInput, Resource,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::error::{unique_violation, AppError, AppResult};
use crate::services::audit::AuditSink;
use crate::services::category::CategoryService;
use crate::store::postgres::like_pattern;

const MODULE: &str = "products";

const PRODUCT_COLUMNS: &str = "id, name, sku, barcode, brand_id, category_id, child_category_id, \
     price, sales_price, created_by, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
}

impl ProductService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
        if let Some(q) = validation::normalize_search(filter.search.as_deref()) {
            let pattern = like_pattern(&q);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR sku ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR barcode ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(brand_id) = filter.brand_id {
            qb.push(" AND brand_id = ").push_bind(brand_id);
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
    }

    /// Newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        actor.authorize(Resource::Product, Action::View)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        Self::push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(pagination.per_page))
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);
        let products = qb.build_query_as::<Product>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok(PaginatedResponse::from_page(products, pagination, total.max(0) as u64))
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Product> {
        actor.authorize(Resource::Product, Action::View)?;

        sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Brand and category must exist; a child category must belong to the category.
    async fn check_references(&self, input: &ProductInput) -> AppResult<()> {
        let brand_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM brands WHERE id = $1)")
            .bind(input.brand_id)
            .fetch_one(&self.db)
            .await?;
        if !brand_exists {
            return Err(AppError::validation("brand_id", "The selected brand does not exist"));
        }

        let categories = CategoryService::new(self.db.clone(), self.audit.clone());
        if categories.find(input.category_id).await?.is_none() {
            return Err(AppError::validation(
                "category_id",
                "The selected category does not exist",
            ));
        }

        if let Some(child_id) = input.child_category_id {
            let child = categories.find_child(child_id).await?.ok_or_else(|| {
                AppError::validation("child_category_id", "The selected child category does not exist")
            })?;
            validation::validate_child_category(input.category_id, &child)?;
        }

        Ok(())
    }

    pub async fn create(&self, actor: &Actor, input: ProductInput) -> AppResult<Product> {
        actor.authorize(Resource::Product, Action::Create)?;
        let input = input.normalized();
        input.validate()?;
        self.check_references(&input).await?;

        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, sku, barcode, brand_id, category_id, child_category_id,
                                  price, sales_price, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.brand_id)
        .bind(input.category_id)
        .bind(input.child_category_id)
        .bind(input.price)
        .bind(input.sales_price)
        .bind(actor.user_id)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_violation(e, "sku"))?;

        tracing::info!(product_id = %product.id, "Product created");
        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Created,
                MODULE,
                format!("Created product: {} (ID: {})", product.name, product.id),
            ))
            .await;

        Ok(product)
    }

    /// Price changes apply to future movements only; recorded snapshots keep
    /// the prices they captured.
    pub async fn update(&self, actor: &Actor, id: Uuid, input: ProductInput) -> AppResult<Product> {
        actor.authorize(Resource::Product, Action::Edit)?;
        let input = input.normalized();
        input.validate()?;
        self.check_references(&input).await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $2, sku = $3, barcode = $4, brand_id = $5, category_id = $6,
                child_category_id = $7, price = $8, sales_price = $9, updated_at = $10
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.brand_id)
        .bind(input.category_id)
        .bind(input.child_category_id)
        .bind(input.price)
        .bind(input.sales_price)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| unique_violation(e, "sku"))?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Updated,
                MODULE,
                format!("Updated product: {} (ID: {})", product.name, product.id),
            ))
            .await;

        Ok(product)
    }

    /// Ledger entries keep referencing the deleted product id.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.authorize(Resource::Product, Action::Delete)?;

        let name: String = sqlx::query_scalar("DELETE FROM products WHERE id = $1 RETURNING name")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Deleted,
                MODULE,
                format!("Deleted product: {} (ID: {})", name, id),
            ))
            .await;

        Ok(())
    }
}
