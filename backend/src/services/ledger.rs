//! Stock movement ledger service
//!
//! Records, edits and deletes stock-in / stock-out movements. Every write
//! keeps the movement and its price snapshot paired and emits one audit
//! event after the data change has committed.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use shared::{
    validation, Action, Actor, AuditAction, AuditEvent, Direction, LedgerEntry, LedgerFilter,
    MovementAuditPayload, MovementInput, PaginatedResponse, Pagination, PriceSnapshot,
    ProductLookup, RangeTotals, Resource, StockMovement,
};
use uuid::Uuid;
use validator::Validate;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::AuditSink;
use crate::store::LedgerStore;

fn resource(direction: Direction) -> Resource {
    match direction {
        Direction::In => Resource::StockIn,
        Direction::Out => Resource::StockOut,
    }
}

fn audit_action(direction: Direction) -> AuditAction {
    match direction {
        Direction::In => AuditAction::StockIn,
        Direction::Out => AuditAction::StockOut,
    }
}

/// Falls back to [`plain_payload`] if the payload cannot be serialised.
fn audit_payload(movement: &StockMovement) -> String {
    serde_json::to_string(&MovementAuditPayload::from(movement)).unwrap_or_else(|e| {
        tracing::warn!(movement_id = %movement.id, error = %e, "Failed to serialise audit payload");
        plain_payload(movement)
    })
}

fn plain_payload(movement: &StockMovement) -> String {
    format!(
        "{} {} (ID: {}) quantity {}",
        movement.direction.label(),
        movement.product_id,
        movement.id,
        movement.quantity
    )
}

/// One page of a movement listing with the filters that produced it
#[derive(Debug, Clone, Serialize)]
pub struct MovementList {
    pub movements: PaginatedResponse<LedgerEntry>,
    pub filters: LedgerFilter,
    /// Stock-out listings only
    #[serde(rename = "rangeTotals", skip_serializing_if = "Option::is_none")]
    pub range_totals: Option<RangeTotals>,
}

#[derive(Clone)]
pub struct StockLedgerService {
    store: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    settings: InventoryConfig,
}

impl StockLedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, audit: Arc<dyn AuditSink>, settings: InventoryConfig) -> Self {
        Self {
            store,
            audit,
            settings,
        }
    }

    async fn existing_product(&self, product_id: Uuid) -> AppResult<shared::Product> {
        self.store
            .product(product_id)
            .await?
            .ok_or_else(|| AppError::validation("product_id", "The selected product does not exist"))
    }

    async fn existing_movement(&self, direction: Direction, id: Uuid) -> AppResult<StockMovement> {
        self.store
            .movement(direction, id)
            .await?
            .ok_or_else(|| AppError::NotFound(direction.label().to_string()))
    }

    /// Reject taking `requested` units off a product's balance when that
    /// would leave it below zero, unless negative stock is allowed.
    /// `released` is stock the same write puts back (the edited movement's
    /// own stock-out, or a stock-in's new quantity).
    async fn ensure_available(&self, product_id: Uuid, requested: i32, released: i64) -> AppResult<()> {
        if self.settings.allow_negative_stock {
            return Ok(());
        }
        let available = self
            .store
            .product_stock(product_id)
            .await?
            .map(|s| s.raw_remaining())
            .unwrap_or(0)
            + released;

        if available < i64::from(requested) {
            return Err(shared::DomainError::InsufficientStock {
                product_id,
                available,
                requested: i64::from(requested),
            }
            .into());
        }
        Ok(())
    }

    /// Record a movement with a snapshot of the product's current prices.
    pub async fn record(&self, actor: &Actor, direction: Direction, input: MovementInput) -> AppResult<StockMovement> {
        actor.authorize(resource(direction), Action::Create)?;
        input.validate()?;

        let product = self.existing_product(input.product_id).await?;
        if direction == Direction::Out {
            self.ensure_available(product.id, input.quantity, 0).await?;
        }

        let movement = StockMovement::record(direction, &input, actor.user_id, Utc::now());
        let snapshot = self.store.insert_movement(&movement, &product).await?;

        tracing::info!(
            movement_id = %movement.id,
            snapshot_id = %snapshot.id,
            direction = %direction,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            "Stock movement recorded"
        );

        self.audit
            .record(AuditEvent::by(
                actor,
                audit_action(direction),
                direction.module(),
                audit_payload(&movement),
            ))
            .await;

        Ok(movement)
    }

    /// Edit a movement. Snapshot prices stay as captured; only the quantity follows.
    pub async fn update(
        &self,
        actor: &Actor,
        direction: Direction,
        id: Uuid,
        input: MovementInput,
    ) -> AppResult<StockMovement> {
        actor.authorize(resource(direction), Action::Edit)?;
        input.validate()?;

        let mut movement = self.existing_movement(direction, id).await?;
        self.existing_product(input.product_id).await?;

        let same_product = movement.product_id == input.product_id;
        match direction {
            Direction::Out => {
                let released = if same_product { i64::from(movement.quantity) } else { 0 };
                self.ensure_available(input.product_id, input.quantity, released).await?;
            }
            Direction::In if !same_product || input.quantity < movement.quantity => {
                let restored = if same_product { i64::from(input.quantity) } else { 0 };
                self.ensure_available(movement.product_id, movement.quantity, restored).await?;
            }
            Direction::In => {}
        }

        movement.apply(&input, Utc::now());
        self.store.update_movement(&movement).await?;

        tracing::info!(movement_id = %movement.id, direction = %direction, quantity = movement.quantity, "Stock movement updated");

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Updated,
                direction.module(),
                audit_payload(&movement),
            ))
            .await;

        Ok(movement)
    }

    /// Delete a movement and its snapshot. The audit entry carries the state
    /// as it was before deletion.
    pub async fn delete(&self, actor: &Actor, direction: Direction, id: Uuid) -> AppResult<()> {
        actor.authorize(resource(direction), Action::Delete)?;

        let movement = self.existing_movement(direction, id).await?;
        if direction == Direction::In {
            self.ensure_available(movement.product_id, movement.quantity, 0).await?;
        }
        let payload = audit_payload(&movement);

        if !self.store.delete_movement(direction, id).await? {
            return Err(AppError::NotFound(direction.label().to_string()));
        }

        tracing::info!(movement_id = %id, direction = %direction, "Stock movement deleted");

        self.audit
            .record(AuditEvent::by(actor, AuditAction::Deleted, direction.module(), payload))
            .await;

        Ok(())
    }

    /// Products matching a barcode, sku or name fragment. Blank queries return nothing.
    pub async fn search_products(
        &self,
        actor: &Actor,
        direction: Direction,
        query: Option<&str>,
    ) -> AppResult<Vec<ProductLookup>> {
        actor.authorize(resource(direction), Action::View)?;

        match validation::normalize_search(query) {
            Some(needle) => {
                self.store
                    .search_products(&needle, validation::PRODUCT_SEARCH_LIMIT)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Listing for the movement screens. Stock-out listings default to a
    /// trailing window and carry range totals over the whole filtered set.
    pub async fn list(
        &self,
        actor: &Actor,
        direction: Direction,
        filter: LedgerFilter,
        page: Option<u32>,
        today: NaiveDate,
    ) -> AppResult<MovementList> {
        actor.authorize(resource(direction), Action::View)?;

        let filter = match direction {
            Direction::Out => filter.with_default_window(today, self.settings.stock_out_default_days),
            Direction::In => filter,
        };

        let entries = self.store.entries(direction, &filter).await?;
        let range_totals = (direction == Direction::Out).then(|| RangeTotals::of(&entries));
        let movements = PaginatedResponse::from_items(
            entries,
            Pagination::new(page, self.settings.list_page_size),
        );

        Ok(MovementList {
            movements,
            filters: filter,
            range_totals,
        })
    }

    pub async fn snapshot(&self, actor: &Actor, direction: Direction, id: Uuid) -> AppResult<PriceSnapshot> {
        actor.authorize(resource(direction), Action::View)?;

        self.store
            .snapshot(direction, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Price snapshot".to_string()))
    }
}
