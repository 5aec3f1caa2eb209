//! Ledger persistence
//!
//! The ledger services talk to storage through [`LedgerStore`]. The
//! Postgres implementation is used by the server; the in-memory one backs
//! the integration tests and local experiments.

use async_trait::async_trait;
use shared::{
    Direction, LedgerEntry, LedgerFilter, PriceSnapshot, Product, ProductLookup, ProductStock,
    StockMovement,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;
pub mod snapshots;

pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn product(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Case-insensitive substring search on barcode, sku and name, ordered by name.
    async fn search_products(&self, needle: &str, limit: usize) -> AppResult<Vec<ProductLookup>>;

    /// Ledger totals for every product, ordered by product name.
    async fn product_stocks(&self) -> AppResult<Vec<ProductStock>>;

    async fn product_stock(&self, product_id: Uuid) -> AppResult<Option<ProductStock>>;

    async fn movement(&self, direction: Direction, id: Uuid) -> AppResult<Option<StockMovement>>;

    async fn snapshot(&self, direction: Direction, movement_id: Uuid) -> AppResult<Option<PriceSnapshot>>;

    /// Persist a new movement together with a snapshot of `product`'s current
    /// prices. Both rows are written or neither is.
    async fn insert_movement(&self, movement: &StockMovement, product: &Product) -> AppResult<PriceSnapshot>;

    /// Persist an edited movement and bring its snapshot quantity in line.
    async fn update_movement(&self, movement: &StockMovement) -> AppResult<()>;

    /// Remove a movement and its snapshot. Returns false when nothing existed.
    async fn delete_movement(&self, direction: Direction, id: Uuid) -> AppResult<bool>;

    /// Entries on one side of the ledger matching `filter`, newest first.
    async fn entries(&self, direction: Direction, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>>;
}
