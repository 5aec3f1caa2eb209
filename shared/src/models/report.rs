//! Report aggregation
//!
//! Builds the five report tabs from ledger entries and product stock
//! totals. Rows may be paginated; totals and footers always cover the full
//! filtered set so they do not change while paging.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Direction, LedgerEntry, LedgerFilter};
use crate::error::DomainError;
use crate::pricing;
use crate::types::{Pagination, Rows};
use crate::valuation::{InventoryValuation, ProductStock};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportTab {
    #[default]
    StockIn,
    StockOut,
    SalesIn,
    SalesOut,
    Inventory,
}

impl ReportTab {
    pub const ALL: [ReportTab; 5] = [
        ReportTab::StockIn,
        ReportTab::StockOut,
        ReportTab::SalesIn,
        ReportTab::SalesOut,
        ReportTab::Inventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTab::StockIn => "stock_in",
            ReportTab::StockOut => "stock_out",
            ReportTab::SalesIn => "sales_in",
            ReportTab::SalesOut => "sales_out",
            ReportTab::Inventory => "inventory",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportTab::StockIn => "Stock In",
            ReportTab::StockOut => "Stock Out",
            ReportTab::SalesIn => "Sales In",
            ReportTab::SalesOut => "Sales Out",
            ReportTab::Inventory => "Inventory",
        }
    }

    /// Ledger side the tab reads from; `None` for the inventory tab.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            ReportTab::StockIn | ReportTab::SalesIn => Some(Direction::In),
            ReportTab::StockOut | ReportTab::SalesOut => Some(Direction::Out),
            ReportTab::Inventory => None,
        }
    }

    pub fn is_sales(&self) -> bool {
        matches!(self, ReportTab::SalesIn | ReportTab::SalesOut)
    }
}

impl fmt::Display for ReportTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportTab {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportTab::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownReportTab(s.to_string()))
    }
}

/// Report filters. All optional, combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportFilter {
    pub date_from: Option<chrono::NaiveDate>,
    pub date_to: Option<chrono::NaiveDate>,
    pub product_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl From<&ReportFilter> for LedgerFilter {
    fn from(f: &ReportFilter) -> Self {
        LedgerFilter {
            date_from: f.date_from,
            date_to: f.date_to,
            product_id: f.product_id,
            created_by: f.created_by,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRow {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub remaining_qty: i64,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
    pub unit_price: Decimal,
    pub unit_sales_price: Option<Decimal>,
    pub total_value: Decimal,
    pub total_value_sales: Decimal,
}

impl From<&ProductStock> for InventoryRow {
    fn from(s: &ProductStock) -> Self {
        Self {
            id: s.product_id,
            name: s.name.clone(),
            sku: s.sku.clone(),
            barcode: s.barcode.clone(),
            remaining_qty: s.remaining(),
            price: s.price,
            sales_price: s.sales_price,
            unit_price: s.price,
            unit_sales_price: s.sales_price,
            total_value: s.value_at_cost(),
            total_value_sales: s.value_at_sales_price(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventoryTotals {
    pub total_products: usize,
    pub remaining_qty: i64,
    pub inventory_value: Decimal,
    pub inventory_value_sales: Decimal,
}

/// Product as it appears on a movement row; prices are the row's unit prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportProduct {
    pub id: Uuid,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportUser {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementRow {
    pub id: Uuid,
    pub product: ReportProduct,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_sales_price: Option<Decimal>,
    /// Outgoing tabs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_unit: Option<Decimal>,
    pub amount: Decimal,
    pub sale_amount: Decimal,
    pub timestamp: String,
    pub created_by: Uuid,
    pub user: Option<ReportUser>,
    pub note: Option<String>,
}

impl MovementRow {
    pub fn build(tab: ReportTab, entry: &LedgerEntry) -> Self {
        let unit_price = entry.unit_price();
        let unit_sales_price = entry.unit_sales_price();
        let qty = Decimal::from(entry.quantity);

        let (effective_unit, amount, sale_amount) = match tab.direction() {
            Some(Direction::Out) => {
                let effective = pricing::effective_unit(unit_price, unit_sales_price);
                let amount = if tab.is_sales() { qty * effective } else { Decimal::ZERO };
                (Some(effective), amount, Decimal::ZERO)
            }
            _ if tab.is_sales() => {
                let sale_amount = match unit_sales_price {
                    Some(sales) if !sales.is_zero() => qty * sales,
                    _ => Decimal::ZERO,
                };
                (None, qty * unit_price, sale_amount)
            }
            _ => (None, Decimal::ZERO, Decimal::ZERO),
        };

        Self {
            id: entry.id,
            product: ReportProduct {
                id: entry.product_id,
                name: entry.product.as_ref().map(|p| p.name.clone()),
                sku: entry.product.as_ref().and_then(|p| p.sku.clone()),
                barcode: entry.product.as_ref().and_then(|p| p.barcode.clone()),
                price: unit_price,
                sales_price: unit_sales_price,
            },
            quantity: entry.quantity,
            unit_price,
            unit_sales_price,
            effective_unit,
            amount,
            sale_amount,
            timestamp: entry.occurred_at.format(TIMESTAMP_FORMAT).to_string(),
            created_by: entry.created_by,
            user: entry.creator_name.as_ref().map(|name| ReportUser {
                id: entry.created_by,
                name: name.clone(),
            }),
            note: entry.note.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovementTotals {
    pub qty: i64,
    pub amount: Decimal,
    /// Incoming tabs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportFooter {
    pub total_products: usize,
    pub total_price: Decimal,
    pub total_sales_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabReport<R, T> {
    pub tab: ReportTab,
    pub rows: Rows<R>,
    pub totals: T,
    pub footer: ReportFooter,
}

/// Output of the report aggregator for any tab
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Inventory(TabReport<InventoryRow, InventoryTotals>),
    Movements(TabReport<MovementRow, MovementTotals>),
}

impl Report {
    pub fn tab(&self) -> ReportTab {
        match self {
            Report::Inventory(r) => r.tab,
            Report::Movements(r) => r.tab,
        }
    }

    pub fn footer(&self) -> &ReportFooter {
        match self {
            Report::Inventory(r) => &r.footer,
            Report::Movements(r) => &r.footer,
        }
    }
}

/// Inventory tab: one row per product, in the order given (by name).
pub fn inventory_report(
    stocks: &[ProductStock],
    pagination: Option<Pagination>,
) -> TabReport<InventoryRow, InventoryTotals> {
    let rows: Vec<InventoryRow> = stocks.iter().map(InventoryRow::from).collect();
    let valuation = InventoryValuation::of(stocks);

    let totals = InventoryTotals {
        total_products: valuation.total_products,
        remaining_qty: valuation.remaining_qty,
        inventory_value: valuation.inventory_value,
        inventory_value_sales: valuation.inventory_value_sales,
    };
    let footer = ReportFooter {
        total_products: rows.len(),
        total_price: rows.iter().map(|r| r.unit_price).sum(),
        total_sales_price: rows.iter().filter_map(|r| r.unit_sales_price).sum(),
    };

    TabReport {
        tab: ReportTab::Inventory,
        rows: Rows::build(rows, pagination),
        totals,
        footer,
    }
}

/// Movement tabs. `entries` must already be filtered and ordered newest first.
pub fn movement_report(
    tab: ReportTab,
    entries: &[LedgerEntry],
    pagination: Option<Pagination>,
) -> TabReport<MovementRow, MovementTotals> {
    let rows: Vec<MovementRow> = entries.iter().map(|e| MovementRow::build(tab, e)).collect();

    let incoming = tab.direction() == Some(Direction::In);
    let totals = MovementTotals {
        qty: rows.iter().map(|r| i64::from(r.quantity)).sum(),
        amount: rows.iter().map(|r| r.amount).sum(),
        sale_amount: incoming.then(|| rows.iter().map(|r| r.sale_amount).sum()),
    };
    let distinct: HashSet<Uuid> = rows.iter().map(|r| r.product.id).collect();
    let footer = ReportFooter {
        total_products: distinct.len(),
        total_price: rows.iter().map(|r| r.unit_price).sum(),
        total_sales_price: rows.iter().filter_map(|r| r.unit_sales_price).sum(),
    };

    TabReport {
        tab,
        rows: Rows::build(rows, pagination),
        totals,
        footer,
    }
}

/// A priced line for range totals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricedLine {
    pub quantity: i64,
    pub unit_price: Decimal,
    pub unit_sales_price: Option<Decimal>,
}

impl From<&LedgerEntry> for PricedLine {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            quantity: i64::from(e.quantity),
            unit_price: e.unit_price(),
            unit_sales_price: e.unit_sales_price(),
        }
    }
}

/// Totals shown under the stock-out listing for the filtered window
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotals {
    pub sale_subtotal: Decimal,
    pub regular_subtotal: Decimal,
    pub final_total: Decimal,
    pub total_qty: i64,
}

impl RangeTotals {
    pub fn from_lines(lines: impl IntoIterator<Item = PricedLine>) -> Self {
        let mut totals = Self::default();
        for line in lines.into_iter().filter(|l| l.quantity > 0) {
            let qty = Decimal::from(line.quantity);
            if pricing::has_active_discount(line.unit_price, line.unit_sales_price) {
                totals.sale_subtotal += qty * pricing::effective_unit(line.unit_price, line.unit_sales_price);
            } else {
                totals.regular_subtotal += qty * line.unit_price;
            }
            totals.total_qty += line.quantity;
        }
        totals.final_total = totals.sale_subtotal + totals.regular_subtotal;
        totals
    }

    pub fn of(entries: &[LedgerEntry]) -> Self {
        Self::from_lines(entries.iter().map(PricedLine::from))
    }
}
