//! In-memory ledger store.
//!
//! Intended for tests and local experiments. Mirrors the Postgres store's
//! pairing rules: one snapshot per movement, written and removed together.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Direction, LedgerEntry, LedgerFilter, PriceSnapshot, Product, ProductLookup, ProductRef,
    ProductStock, StockMovement,
};
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    users: HashMap<Uuid, String>,
    movements: HashMap<(Direction, Uuid), StockMovement>,
    snapshots: Vec<PriceSnapshot>,
}

#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("ledger store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("ledger store lock poisoned".to_string()))
    }

    /// Insert or replace a catalog product.
    pub fn put_product(&self, product: Product) -> AppResult<()> {
        self.write()?.products.insert(product.id, product);
        Ok(())
    }

    pub fn remove_product(&self, id: Uuid) -> AppResult<()> {
        self.write()?.products.remove(&id);
        Ok(())
    }

    /// Register a user name so entries can show who recorded them.
    pub fn put_user(&self, id: Uuid, name: impl Into<String>) -> AppResult<()> {
        self.write()?.users.insert(id, name.into());
        Ok(())
    }

    /// Every stored snapshot, for pairing checks.
    pub fn all_snapshots(&self) -> AppResult<Vec<PriceSnapshot>> {
        Ok(self.read()?.snapshots.clone())
    }

    pub fn movement_count(&self, direction: Direction) -> AppResult<usize> {
        Ok(self
            .read()?
            .movements
            .keys()
            .filter(|(d, _)| *d == direction)
            .count())
    }

    fn stock_for(state: &State, product: &Product) -> ProductStock {
        let sum = |direction: Direction| -> i64 {
            state
                .movements
                .values()
                .filter(|m| m.direction == direction && m.product_id == product.id)
                .map(|m| i64::from(m.quantity))
                .sum()
        };
        ProductStock {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            barcode: product.barcode.clone(),
            price: product.price,
            sales_price: product.sales_price,
            stock_in_qty: sum(Direction::In),
            stock_out_qty: sum(Direction::Out),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn search_products(&self, needle: &str, limit: usize) -> AppResult<Vec<ProductLookup>> {
        let state = self.read()?;
        let mut hits: Vec<ProductLookup> = state
            .products
            .values()
            .map(ProductLookup::from)
            .filter(|p| p.matches(needle))
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn product_stocks(&self) -> AppResult<Vec<ProductStock>> {
        let state = self.read()?;
        let mut stocks: Vec<ProductStock> = state
            .products
            .values()
            .map(|p| Self::stock_for(&state, p))
            .collect();
        stocks.sort_by(|a, b| a.name.cmp(&b.name).then(a.product_id.cmp(&b.product_id)));
        Ok(stocks)
    }

    async fn product_stock(&self, product_id: Uuid) -> AppResult<Option<ProductStock>> {
        let state = self.read()?;
        Ok(state
            .products
            .get(&product_id)
            .map(|p| Self::stock_for(&state, p)))
    }

    async fn movement(&self, direction: Direction, id: Uuid) -> AppResult<Option<StockMovement>> {
        Ok(self.read()?.movements.get(&(direction, id)).cloned())
    }

    async fn snapshot(&self, direction: Direction, movement_id: Uuid) -> AppResult<Option<PriceSnapshot>> {
        Ok(self
            .read()?
            .snapshots
            .iter()
            .find(|s| s.belongs_to(direction, movement_id))
            .cloned())
    }

    async fn insert_movement(&self, movement: &StockMovement, product: &Product) -> AppResult<PriceSnapshot> {
        let mut state = self.write()?;
        let key = (movement.direction, movement.id);

        if state.snapshots.iter().any(|s| s.belongs_to(movement.direction, movement.id)) {
            return Err(AppError::Conflict {
                resource: "price_snapshot".to_string(),
                message: format!("Movement {} already has a price snapshot", movement.id),
            });
        }
        if state.movements.contains_key(&key) {
            return Err(AppError::DuplicateEntry("id".to_string()));
        }

        let snapshot = PriceSnapshot::capture(movement, product);
        state.movements.insert(key, movement.clone());
        state.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn update_movement(&self, movement: &StockMovement) -> AppResult<()> {
        let mut state = self.write()?;
        let key = (movement.direction, movement.id);
        if !state.movements.contains_key(&key) {
            return Err(AppError::NotFound(movement.direction.label().to_string()));
        }
        state.movements.insert(key, movement.clone());

        let now = Utc::now();
        if let Some(snapshot) = state
            .snapshots
            .iter_mut()
            .find(|s| s.belongs_to(movement.direction, movement.id))
        {
            snapshot.sync_quantity(movement, now);
        }
        Ok(())
    }

    async fn delete_movement(&self, direction: Direction, id: Uuid) -> AppResult<bool> {
        let mut state = self.write()?;
        state.snapshots.retain(|s| !s.belongs_to(direction, id));
        Ok(state.movements.remove(&(direction, id)).is_some())
    }

    async fn entries(&self, direction: Direction, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let state = self.read()?;
        let mut entries: Vec<LedgerEntry> = state
            .movements
            .values()
            .filter(|m| m.direction == direction)
            .map(|m| LedgerEntry {
                id: m.id,
                direction,
                product_id: m.product_id,
                quantity: m.quantity,
                note: m.note.clone(),
                occurred_at: m.occurred_at,
                created_by: m.created_by,
                creator_name: state.users.get(&m.created_by).cloned(),
                product: state.products.get(&m.product_id).map(ProductRef::from),
                snapshot: state
                    .snapshots
                    .iter()
                    .find(|s| s.belongs_to(direction, m.id))
                    .map(PriceSnapshot::prices),
            })
            .filter(|e| filter.matches(e))
            .collect();

        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}
