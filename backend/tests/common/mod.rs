//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use inventory_server::config::InventoryConfig;
use inventory_server::services::{MemoryAuditSink, ReportingService, StockLedgerService, ValuationService};
use inventory_server::store::InMemoryLedgerStore;
use rust_decimal::Decimal;
use shared::{Actor, Direction, MovementInput, Product, Role, StockMovement};
use uuid::Uuid;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

pub fn actor(role: Role) -> Actor {
    Actor::new(Uuid::new_v4(), format!("{} user", role.label()), role)
        .with_origin(Some("192.168.1.50".into()), Some("test-agent".into()))
}

pub fn product(name: &str, price: &str, sales_price: Option<&str>) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        sku: Some(format!("SKU-{}", name.to_uppercase())),
        barcode: Some(format!("885{}", name.len())),
        brand_id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        child_category_id: None,
        price: dec(price),
        sales_price: sales_price.map(dec),
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn input(product_id: Uuid, quantity: i32, occurred_at: Option<DateTime<Utc>>) -> MovementInput {
    MovementInput {
        product_id,
        quantity,
        note: None,
        occurred_at,
    }
}

/// Services over one in-memory store and audit sink.
pub struct Harness {
    pub store: Arc<InMemoryLedgerStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub ledger: StockLedgerService,
    pub reports: ReportingService,
    pub valuation: ValuationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(InventoryConfig::default())
    }

    pub fn with_settings(settings: InventoryConfig) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let page_size = settings.report_page_size;
        Self {
            ledger: StockLedgerService::new(store.clone(), audit.clone(), settings),
            reports: ReportingService::new(store.clone(), page_size),
            valuation: ValuationService::new(store.clone()),
            store,
            audit,
        }
    }

    pub fn add_product(&self, name: &str, price: &str, sales_price: Option<&str>) -> Product {
        let p = product(name, price, sales_price);
        self.store.put_product(p.clone()).unwrap();
        p
    }

    pub async fn record(
        &self,
        actor: &Actor,
        direction: Direction,
        product_id: Uuid,
        quantity: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> StockMovement {
        self.ledger
            .record(actor, direction, input(product_id, quantity, occurred_at))
            .await
            .unwrap()
    }
}
