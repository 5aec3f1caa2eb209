//! Inventory valuation and dashboard figures
//!
//! Remaining stock is derived from the ledger on each call; nothing is cached.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    daily_stock_out_series, global_totals, own_stock_out_totals, Action, Actor, Dashboard,
    DashboardScope, Direction, InventoryValuation, LedgerFilter, ProductValuation, Resource,
    GRAPH_DAYS,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct ValuationService {
    store: Arc<dyn LedgerStore>,
}

impl ValuationService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// `sum(IN) - sum(OUT)` for one product, unclamped.
    pub async fn remaining_quantity(&self, product_id: Uuid) -> AppResult<i64> {
        Ok(self
            .store
            .product_stock(product_id)
            .await?
            .map(|s| s.raw_remaining())
            .unwrap_or(0))
    }

    pub async fn product_valuation(&self, actor: &Actor, product_id: Uuid) -> AppResult<ProductValuation> {
        actor.authorize(Resource::Product, Action::View)?;

        self.store
            .product_stock(product_id)
            .await?
            .map(|s| s.valuation())
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn inventory_valuation(&self, actor: &Actor) -> AppResult<InventoryValuation> {
        actor.authorize(Resource::Product, Action::View)?;

        let stocks = self.store.product_stocks().await?;
        Ok(InventoryValuation::of(&stocks))
    }

    /// Cashiers see only their own stock-out figures; every other role sees
    /// global totals. The graph covers the last seven days ending `today`.
    pub async fn dashboard(&self, actor: &Actor, today: NaiveDate) -> AppResult<Dashboard> {
        actor.authorize(Resource::Dashboard, Action::View)?;

        if actor.is_cashier() {
            let own = LedgerFilter {
                created_by: Some(actor.user_id),
                ..Default::default()
            };
            let outs = self.store.entries(Direction::Out, &own).await?;
            return Ok(Dashboard {
                scope: DashboardScope::Own,
                totals: own_stock_out_totals(&outs),
                graph_data: daily_stock_out_series(&outs, today, GRAPH_DAYS),
            });
        }

        let all = LedgerFilter::default();
        let ins = self.store.entries(Direction::In, &all).await?;
        let outs = self.store.entries(Direction::Out, &all).await?;
        let stocks = self.store.product_stocks().await?;

        Ok(Dashboard {
            scope: DashboardScope::Global,
            totals: global_totals(&ins, &outs, &stocks),
            graph_data: daily_stock_out_series(&outs, today, GRAPH_DAYS),
        })
    }
}
