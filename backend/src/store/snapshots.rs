//! Price snapshot persistence
//!
//! Every function takes the caller's connection so it runs inside the same
//! transaction as the movement write it accompanies.

use chrono::Utc;
use shared::{Direction, PriceSnapshot, Product, StockMovement};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Snapshot column referencing the parent movement
pub(crate) fn parent_column(direction: Direction) -> &'static str {
    match direction {
        Direction::In => "stock_in_id",
        Direction::Out => "stock_out_id",
    }
}

const SNAPSHOT_COLUMNS: &str =
    "id, product_id, stock_in_id, stock_out_id, quantity, unit_price, unit_sales_price, created_at, updated_at";

/// Freeze `product`'s current prices for `movement`.
pub async fn create_snapshot(
    conn: &mut PgConnection,
    movement: &StockMovement,
    product: &Product,
) -> AppResult<PriceSnapshot> {
    let snapshot = PriceSnapshot::capture(movement, product);

    let inserted = sqlx::query_as::<_, PriceSnapshot>(&format!(
        r#"
        INSERT INTO product_price_snapshots ({SNAPSHOT_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {SNAPSHOT_COLUMNS}
        "#
    ))
    .bind(snapshot.id)
    .bind(snapshot.product_id)
    .bind(snapshot.stock_in_id)
    .bind(snapshot.stock_out_id)
    .bind(snapshot.quantity)
    .bind(snapshot.unit_price)
    .bind(snapshot.unit_sales_price)
    .bind(snapshot.created_at)
    .bind(snapshot.updated_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => AppError::Conflict {
            resource: "price_snapshot".to_string(),
            message: format!("Movement {} already has a price snapshot", movement.id),
        },
        _ => AppError::DatabaseError(e),
    })?;

    Ok(inserted)
}

/// Copy the movement's quantity onto its snapshot. A missing snapshot is left alone.
pub async fn sync_quantity(conn: &mut PgConnection, movement: &StockMovement) -> AppResult<()> {
    let result = sqlx::query(&format!(
        "UPDATE product_price_snapshots SET quantity = $1, updated_at = $2 WHERE {} = $3",
        parent_column(movement.direction)
    ))
    .bind(movement.quantity)
    .bind(Utc::now())
    .bind(movement.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(movement_id = %movement.id, "No price snapshot to sync");
    }

    Ok(())
}

pub async fn delete_for_movement(
    conn: &mut PgConnection,
    direction: Direction,
    movement_id: Uuid,
) -> AppResult<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM product_price_snapshots WHERE {} = $1",
        parent_column(direction)
    ))
    .bind(movement_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn find_for_movement(
    conn: &mut PgConnection,
    direction: Direction,
    movement_id: Uuid,
) -> AppResult<Option<PriceSnapshot>> {
    let snapshot = sqlx::query_as::<_, PriceSnapshot>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM product_price_snapshots WHERE {} = $1",
        parent_column(direction)
    ))
    .bind(movement_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(snapshot)
}
