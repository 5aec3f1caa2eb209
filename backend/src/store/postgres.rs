//! Postgres-backed ledger store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Direction, LedgerEntry, LedgerFilter, PriceSnapshot, Product, ProductLookup, ProductRef,
    ProductStock, SnapshotPrices, StockMovement,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{snapshots, LedgerStore};
use crate::error::AppResult;

pub(crate) fn movement_table(direction: Direction) -> &'static str {
    match direction {
        Direction::In => "stock_ins",
        Direction::Out => "stock_outs",
    }
}

/// Escape LIKE wildcards and wrap for substring matching.
pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const PRODUCT_COLUMNS: &str = "id, name, sku, barcode, brand_id, category_id, child_category_id, \
     price, sales_price, created_by, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    note: Option<String>,
    occurred_at: DateTime<Utc>,
    created_by: Uuid,
    creator_name: Option<String>,
    product_name: Option<String>,
    product_sku: Option<String>,
    product_barcode: Option<String>,
    product_price: Option<Decimal>,
    product_sales_price: Option<Decimal>,
    snapshot_unit_price: Option<Decimal>,
    snapshot_unit_sales_price: Option<Decimal>,
}

impl EntryRow {
    fn into_entry(self, direction: Direction) -> LedgerEntry {
        let product = self.product_name.map(|name| ProductRef {
            name,
            sku: self.product_sku,
            barcode: self.product_barcode,
            price: self.product_price.unwrap_or_default(),
            sales_price: self.product_sales_price,
        });
        let snapshot = self.snapshot_unit_price.map(|unit_price| SnapshotPrices {
            unit_price,
            unit_sales_price: self.snapshot_unit_sales_price,
        });

        LedgerEntry {
            id: self.id,
            direction,
            product_id: self.product_id,
            quantity: self.quantity,
            note: self.note,
            occurred_at: self.occurred_at,
            created_by: self.created_by,
            creator_name: self.creator_name,
            product,
            snapshot,
        }
    }
}

/// Ledger store over the `stock_ins`, `stock_outs` and snapshot tables
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

impl PgLedgerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn stock_query(filter_one: bool) -> String {
        format!(
            r#"
            SELECT p.id AS product_id, p.name, p.sku, p.barcode, p.price, p.sales_price,
                   COALESCE((SELECT SUM(si.quantity) FROM stock_ins si WHERE si.product_id = p.id), 0)::BIGINT AS stock_in_qty,
                   COALESCE((SELECT SUM(so.quantity) FROM stock_outs so WHERE so.product_id = p.id), 0)::BIGINT AS stock_out_qty
            FROM products p
            {}
            ORDER BY p.name, p.id
            "#,
            if filter_one { "WHERE p.id = $1" } else { "" }
        )
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(product)
    }

    async fn search_products(&self, needle: &str, limit: usize) -> AppResult<Vec<ProductLookup>> {
        let pattern = like_pattern(needle);
        let products = sqlx::query_as::<_, ProductLookup>(
            r#"
            SELECT id, name, sku, barcode, price, sales_price
            FROM products
            WHERE barcode ILIKE $1 OR sku ILIKE $1 OR name ILIKE $1
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    async fn product_stocks(&self) -> AppResult<Vec<ProductStock>> {
        let stocks = sqlx::query_as::<_, ProductStock>(&Self::stock_query(false))
            .fetch_all(&self.db)
            .await?;

        Ok(stocks)
    }

    async fn product_stock(&self, product_id: Uuid) -> AppResult<Option<ProductStock>> {
        let stock = sqlx::query_as::<_, ProductStock>(&Self::stock_query(true))
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(stock)
    }

    async fn movement(&self, direction: Direction, id: Uuid) -> AppResult<Option<StockMovement>> {
        let movement = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT id, '{}'::TEXT AS direction, product_id, quantity, note, occurred_at,
                   created_by, created_at, updated_at
            FROM {}
            WHERE id = $1
            "#,
            direction.as_str(),
            movement_table(direction)
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(movement)
    }

    async fn snapshot(&self, direction: Direction, movement_id: Uuid) -> AppResult<Option<PriceSnapshot>> {
        let mut conn = self.db.acquire().await?;
        snapshots::find_for_movement(&mut conn, direction, movement_id).await
    }

    async fn insert_movement(&self, movement: &StockMovement, product: &Product) -> AppResult<PriceSnapshot> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, product_id, quantity, note, occurred_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            movement_table(movement.direction)
        ))
        .bind(movement.id)
        .bind(movement.product_id)
        .bind(movement.quantity)
        .bind(&movement.note)
        .bind(movement.occurred_at)
        .bind(movement.created_by)
        .bind(movement.created_at)
        .bind(movement.updated_at)
        .execute(&mut *tx)
        .await?;

        let snapshot = snapshots::create_snapshot(&mut tx, movement, product).await?;

        tx.commit().await?;

        Ok(snapshot)
    }

    async fn update_movement(&self, movement: &StockMovement) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!(
            r#"
            UPDATE {}
            SET product_id = $2, quantity = $3, note = $4, occurred_at = $5, updated_at = $6
            WHERE id = $1
            "#,
            movement_table(movement.direction)
        ))
        .bind(movement.id)
        .bind(movement.product_id)
        .bind(movement.quantity)
        .bind(&movement.note)
        .bind(movement.occurred_at)
        .bind(movement.updated_at)
        .execute(&mut *tx)
        .await?;

        snapshots::sync_quantity(&mut tx, movement).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete_movement(&self, direction: Direction, id: Uuid) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        snapshots::delete_for_movement(&mut tx, direction, id).await?;

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", movement_table(direction)))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn entries(&self, direction: Direction, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT m.id, m.product_id, m.quantity, m.note, m.occurred_at, m.created_by,
                   u.name AS creator_name,
                   p.name AS product_name, p.sku AS product_sku, p.barcode AS product_barcode,
                   p.price AS product_price, p.sales_price AS product_sales_price,
                   s.unit_price AS snapshot_unit_price, s.unit_sales_price AS snapshot_unit_sales_price
            FROM {table} m
            LEFT JOIN products p ON p.id = m.product_id
            LEFT JOIN users u ON u.id = m.created_by
            LEFT JOIN product_price_snapshots s ON s.{parent} = m.id
            WHERE TRUE
            "#,
            table = movement_table(direction),
            parent = snapshots::parent_column(direction),
        ));

        if let Some(from) = filter.date_from {
            qb.push(" AND (m.occurred_at AT TIME ZONE 'UTC')::DATE >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND (m.occurred_at AT TIME ZONE 'UTC')::DATE <= ").push_bind(to);
        }
        if let Some(product_id) = filter.product_id {
            qb.push(" AND m.product_id = ").push_bind(product_id);
        }
        if let Some(created_by) = filter.created_by {
            qb.push(" AND m.created_by = ").push_bind(created_by);
        }
        if let Some(search) = shared::validation::normalize_search(filter.search.as_deref()) {
            let pattern = like_pattern(&search);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.sku ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.barcode ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY m.occurred_at DESC, m.created_at DESC, m.id");

        let rows = qb.build_query_as::<EntryRow>().fetch_all(&self.db).await?;

        Ok(rows.into_iter().map(|r| r.into_entry(direction)).collect())
    }
}
