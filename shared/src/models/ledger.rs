//! Stock movement ledger and price snapshot models

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Product;
use crate::pricing;

/// Which side of the ledger a movement belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Audit module and action name for movements on this side.
    pub fn module(&self) -> &'static str {
        match self {
            Direction::In => "stock_in",
            Direction::Out => "stock_out",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "Stock In",
            Direction::Out => "Stock Out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single receipt (IN) or dispatch (OUT) of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: Uuid,
    pub direction: Direction,
    pub product_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
    /// Business timestamp of the movement, used for all date filtering
    pub occurred_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn record(direction: Direction, input: &MovementInput, created_by: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction,
            product_id: input.product_id,
            quantity: input.quantity,
            note: input.note.clone(),
            occurred_at: input.occurred_at.unwrap_or(now),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an edit. The business timestamp is kept when the input omits it;
    /// the creator never changes.
    pub fn apply(&mut self, input: &MovementInput, now: DateTime<Utc>) {
        self.product_id = input.product_id;
        self.quantity = input.quantity;
        self.note = input.note.clone();
        if let Some(at) = input.occurred_at {
            self.occurred_at = at;
        }
        self.updated_at = now;
    }

    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

/// Prices frozen at the moment a movement was recorded.
///
/// Exactly one of `stock_in_id` / `stock_out_id` is set. Prices never change
/// after capture; only `quantity` follows the parent movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceSnapshot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub stock_in_id: Option<Uuid>,
    pub stock_out_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_sales_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn capture(movement: &StockMovement, product: &Product) -> Self {
        let (stock_in_id, stock_out_id) = match movement.direction {
            Direction::In => (Some(movement.id), None),
            Direction::Out => (None, Some(movement.id)),
        };
        Self {
            id: Uuid::new_v4(),
            product_id: movement.product_id,
            stock_in_id,
            stock_out_id,
            quantity: movement.quantity,
            unit_price: product.price,
            unit_sales_price: product.sales_price,
            created_at: movement.created_at,
            updated_at: movement.created_at,
        }
    }

    /// The movement this snapshot belongs to.
    pub fn parent(&self) -> Option<(Direction, Uuid)> {
        match (self.stock_in_id, self.stock_out_id) {
            (Some(id), None) => Some((Direction::In, id)),
            (None, Some(id)) => Some((Direction::Out, id)),
            _ => None,
        }
    }

    pub fn belongs_to(&self, direction: Direction, movement_id: Uuid) -> bool {
        self.parent() == Some((direction, movement_id))
    }

    /// Follow the parent's quantity after an edit. Prices stay frozen.
    pub fn sync_quantity(&mut self, movement: &StockMovement, now: DateTime<Utc>) {
        self.quantity = movement.quantity;
        self.updated_at = now;
    }

    pub fn prices(&self) -> SnapshotPrices {
        SnapshotPrices {
            unit_price: self.unit_price,
            unit_sales_price: self.unit_sales_price,
        }
    }
}

/// Input for recording or editing a movement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MovementInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Payload written into the audit description for movement changes
#[derive(Debug, Clone, Serialize)]
pub struct MovementAuditPayload {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
}

impl From<&StockMovement> for MovementAuditPayload {
    fn from(m: &StockMovement) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            quantity: m.quantity,
            note: m.note.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SnapshotPrices {
    pub unit_price: Decimal,
    pub unit_sales_price: Option<Decimal>,
}

/// Live product fields joined onto a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRef {
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
}

impl From<&Product> for ProductRef {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            sku: p.sku.clone(),
            barcode: p.barcode.clone(),
            price: p.price,
            sales_price: p.sales_price,
        }
    }
}

/// A movement joined with its product, snapshot and creator, as read by
/// listings, reports and the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub direction: Direction,
    pub product_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub creator_name: Option<String>,
    /// None when the product no longer exists
    pub product: Option<ProductRef>,
    pub snapshot: Option<SnapshotPrices>,
}

impl LedgerEntry {
    /// Snapshot unit price, falling back to the live product price, then zero.
    pub fn unit_price(&self) -> Decimal {
        match (&self.snapshot, &self.product) {
            (Some(s), _) => s.unit_price,
            (None, Some(p)) => p.price,
            (None, None) => Decimal::ZERO,
        }
    }

    /// Snapshot sales price (null stays null), falling back to the live product.
    pub fn unit_sales_price(&self) -> Option<Decimal> {
        match (&self.snapshot, &self.product) {
            (Some(s), _) => s.unit_sales_price,
            (None, Some(p)) => p.sales_price,
            (None, None) => None,
        }
    }

    pub fn effective_unit(&self) -> Decimal {
        pricing::effective_unit(self.unit_price(), self.unit_sales_price())
    }

    /// Current catalog price, used by dashboard sales figures.
    pub fn live_price(&self) -> Decimal {
        self.product.as_ref().map(|p| p.price).unwrap_or(Decimal::ZERO)
    }

    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    pub fn product_name(&self) -> &str {
        self.product.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}

/// Filters for movement listings and reports. Dates compare against the
/// UTC calendar day of `occurred_at`, inclusive on both ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub product_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub search: Option<String>,
}

impl LedgerFilter {
    /// Fill in `today - days ..= today` when neither bound is given.
    pub fn with_default_window(mut self, today: NaiveDate, days: u32) -> Self {
        if self.date_from.is_none() && self.date_to.is_none() {
            self.date_from = Some(today - Duration::days(i64::from(days)));
            self.date_to = Some(today);
        }
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        let day = entry.occurred_on();
        if self.date_from.is_some_and(|from| day < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| day > to) {
            return false;
        }
        if self.product_id.is_some_and(|id| id != entry.product_id) {
            return false;
        }
        if self.created_by.is_some_and(|id| id != entry.created_by) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                entry.product.as_ref().is_some_and(|p| {
                    let hit = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&needle));
                    hit(Some(&p.name)) || hit(p.sku.as_deref()) || hit(p.barcode.as_deref())
                })
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(price: i64, sales: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Rice 5kg".into(),
            sku: Some("RC5".into()),
            barcode: None,
            brand_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            child_category_id: None,
            price: Decimal::from(price),
            sales_price: sales.map(Decimal::from),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn movement(direction: Direction, product: &Product, qty: i32) -> StockMovement {
        let input = MovementInput {
            product_id: product.id,
            quantity: qty,
            note: None,
            occurred_at: None,
        };
        StockMovement::record(direction, &input, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_snapshot_has_exactly_one_parent() {
        let p = product(100, Some(80));
        let m = movement(Direction::Out, &p, 3);
        let snap = PriceSnapshot::capture(&m, &p);
        assert_eq!(snap.parent(), Some((Direction::Out, m.id)));
        assert!(snap.stock_in_id.is_none());
        assert_eq!(snap.unit_price, Decimal::from(100));
        assert_eq!(snap.unit_sales_price, Some(Decimal::from(80)));
    }

    #[test]
    fn test_sync_quantity_keeps_prices() {
        let p = product(100, None);
        let mut m = movement(Direction::In, &p, 3);
        let mut snap = PriceSnapshot::capture(&m, &p);
        m.quantity = 9;
        snap.sync_quantity(&m, Utc::now());
        assert_eq!(snap.quantity, 9);
        assert_eq!(snap.unit_price, Decimal::from(100));
    }

    #[test]
    fn test_apply_keeps_timestamp_when_omitted() {
        let p = product(100, None);
        let mut m = movement(Direction::In, &p, 3);
        let original = m.occurred_at;
        let edit = MovementInput {
            product_id: p.id,
            quantity: 4,
            note: Some("recount".into()),
            occurred_at: None,
        };
        m.apply(&edit, Utc::now());
        assert_eq!(m.occurred_at, original);
        assert_eq!(m.quantity, 4);
    }

    #[test]
    fn test_entry_without_snapshot_uses_live_product() {
        let p = product(50, Some(45));
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            direction: Direction::Out,
            product_id: p.id,
            quantity: 2,
            note: None,
            occurred_at: Utc::now(),
            created_by: Uuid::new_v4(),
            creator_name: None,
            product: Some(ProductRef::from(&p)),
            snapshot: None,
        };
        assert_eq!(entry.unit_price(), Decimal::from(50));
        assert_eq!(entry.effective_unit(), Decimal::from(45));
    }

    #[test]
    fn test_snapshot_null_sales_price_stays_null() {
        let p = product(50, Some(45));
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            direction: Direction::Out,
            product_id: p.id,
            quantity: 2,
            note: None,
            occurred_at: Utc::now(),
            created_by: Uuid::new_v4(),
            creator_name: None,
            product: Some(ProductRef::from(&p)),
            snapshot: Some(SnapshotPrices {
                unit_price: Decimal::from(40),
                unit_sales_price: None,
            }),
        };
        assert_eq!(entry.unit_sales_price(), None);
        assert_eq!(entry.effective_unit(), Decimal::from(40));
    }

    #[test]
    fn test_filter_dates_are_inclusive() {
        let p = product(10, None);
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            direction: Direction::In,
            product_id: p.id,
            quantity: 1,
            note: None,
            occurred_at: Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 0).unwrap(),
            created_by: Uuid::new_v4(),
            creator_name: None,
            product: Some(ProductRef::from(&p)),
            snapshot: None,
        };
        let filter = LedgerFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 5, 31),
            ..Default::default()
        };
        assert!(filter.matches(&entry));

        let later = LedgerFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        assert!(!later.matches(&entry));

        let search = LedgerFilter {
            search: Some("rc5".into()),
            ..Default::default()
        };
        assert!(search.matches(&entry));
    }

    #[test]
    fn test_default_window_reaches_back_full_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let filter = LedgerFilter::default().with_default_window(today, 30);
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2024, 5, 31));
        assert_eq!(filter.date_to, Some(today));

        let explicit = LedgerFilter {
            date_to: Some(today),
            ..Default::default()
        }
        .with_default_window(today, 30);
        assert_eq!(explicit.date_from, None);
    }
}
