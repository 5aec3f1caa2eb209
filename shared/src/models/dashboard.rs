//! Dashboard summary models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LedgerEntry;
use crate::types::DateRange;
use crate::valuation::{InventoryValuation, ProductStock};

/// Days covered by the stock-out graph, ending today
pub const GRAPH_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardScope {
    /// Figures across all users
    Global,
    /// Figures limited to the caller's own stock-out entries
    Own,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardTotals {
    pub stock_in_qty: i64,
    pub sales_in: Decimal,
    pub stock_out_qty: i64,
    pub sales_out: Decimal,
    pub products: i64,
    pub inventory_value: Decimal,
    pub inventory_value_sales: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyStockOut {
    pub day: NaiveDate,
    pub stock_out: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub scope: DashboardScope,
    pub totals: DashboardTotals,
    pub graph_data: Vec<DailyStockOut>,
}

/// Quantity and live-price amount of a set of entries.
fn qty_and_amount(entries: &[LedgerEntry]) -> (i64, Decimal) {
    entries.iter().fold((0, Decimal::ZERO), |(qty, amount), e| {
        (
            qty + i64::from(e.quantity),
            amount + Decimal::from(e.quantity) * e.live_price(),
        )
    })
}

/// Totals across the whole ledger and catalog.
pub fn global_totals(
    stock_ins: &[LedgerEntry],
    stock_outs: &[LedgerEntry],
    stocks: &[ProductStock],
) -> DashboardTotals {
    let (stock_in_qty, sales_in) = qty_and_amount(stock_ins);
    let (stock_out_qty, sales_out) = qty_and_amount(stock_outs);
    let valuation = InventoryValuation::of(stocks);

    DashboardTotals {
        stock_in_qty,
        sales_in,
        stock_out_qty,
        sales_out,
        products: valuation.total_products as i64,
        inventory_value: valuation.inventory_value,
        inventory_value_sales: valuation.inventory_value_sales,
    }
}

/// Totals for a cashier: only their own stock-out figures, the rest stay zero.
pub fn own_stock_out_totals(own_outs: &[LedgerEntry]) -> DashboardTotals {
    let (stock_out_qty, sales_out) = qty_and_amount(own_outs);
    DashboardTotals {
        stock_out_qty,
        sales_out,
        ..Default::default()
    }
}

/// Stock-out quantity per day for the trailing `days` days, oldest first.
/// Days without movements report zero.
pub fn daily_stock_out_series(stock_outs: &[LedgerEntry], today: NaiveDate, days: u32) -> Vec<DailyStockOut> {
    let range = DateRange::trailing_days(today, days);
    range
        .days()
        .map(|day| DailyStockOut {
            day,
            stock_out: stock_outs
                .iter()
                .filter(|e| e.occurred_on() == day)
                .map(|e| i64::from(e.quantity))
                .sum(),
        })
        .collect()
}
