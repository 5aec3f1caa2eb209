//! Inventory valuation
//!
//! Remaining quantity is derived from the ledger on every read:
//! `sum(IN) - sum(OUT)` per product. Valuation uses the clamped figure, so a
//! product that went negative through historical data never contributes a
//! negative value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing;

/// Ledger totals for one product together with its live prices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductStock {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
    pub stock_in_qty: i64,
    pub stock_out_qty: i64,
}

impl ProductStock {
    /// Unclamped ledger balance; may be negative.
    pub fn raw_remaining(&self) -> i64 {
        self.stock_in_qty - self.stock_out_qty
    }

    pub fn remaining(&self) -> i64 {
        clamp_remaining(self.raw_remaining())
    }

    pub fn value_at_cost(&self) -> Decimal {
        Decimal::from(self.remaining()) * self.price
    }

    pub fn value_at_sales_price(&self) -> Decimal {
        Decimal::from(self.remaining()) * pricing::sales_valuation_unit(self.price, self.sales_price)
    }

    pub fn valuation(&self) -> ProductValuation {
        ProductValuation {
            product_id: self.product_id,
            raw_remaining: self.raw_remaining(),
            remaining_qty: self.remaining(),
            value_at_cost: self.value_at_cost(),
            value_at_sales_price: self.value_at_sales_price(),
        }
    }
}

pub fn clamp_remaining(raw: i64) -> i64 {
    raw.max(0)
}

/// Valuation of a single product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductValuation {
    pub product_id: Uuid,
    pub raw_remaining: i64,
    pub remaining_qty: i64,
    pub value_at_cost: Decimal,
    pub value_at_sales_price: Decimal,
}

/// Valuation summed over a set of products
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventoryValuation {
    pub total_products: usize,
    pub remaining_qty: i64,
    pub inventory_value: Decimal,
    pub inventory_value_sales: Decimal,
}

impl InventoryValuation {
    pub fn of(stocks: &[ProductStock]) -> Self {
        stocks.iter().fold(
            Self {
                total_products: stocks.len(),
                ..Default::default()
            },
            |mut acc, s| {
                acc.remaining_qty += s.remaining();
                acc.inventory_value += s.value_at_cost();
                acc.inventory_value_sales += s.value_at_sales_price();
                acc
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stock(price: i64, sales: Option<i64>, stock_in: i64, stock_out: i64) -> ProductStock {
        ProductStock {
            product_id: Uuid::new_v4(),
            name: "Soap".into(),
            sku: None,
            barcode: None,
            price: Decimal::from(price),
            sales_price: sales.map(Decimal::from),
            stock_in_qty: stock_in,
            stock_out_qty: stock_out,
        }
    }

    #[test]
    fn test_negative_balance_clamped_for_valuation() {
        let s = stock(100, None, 3, 5);
        assert_eq!(s.raw_remaining(), -2);
        assert_eq!(s.remaining(), 0);
        assert_eq!(s.value_at_cost(), Decimal::ZERO);
    }

    #[test]
    fn test_sales_valuation_falls_back_to_price() {
        assert_eq!(stock(100, Some(0), 7, 2).value_at_sales_price(), Decimal::from(500));
        assert_eq!(stock(100, Some(120), 7, 2).value_at_sales_price(), Decimal::from(600));
    }

    #[test]
    fn test_inventory_totals() {
        let totals = InventoryValuation::of(&[stock(10, None, 5, 1), stock(20, Some(25), 1, 3)]);
        assert_eq!(totals.total_products, 2);
        assert_eq!(totals.remaining_qty, 4);
        assert_eq!(totals.inventory_value, Decimal::from(40));
        assert_eq!(totals.inventory_value_sales, Decimal::from(40));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_valuation_never_negative(
            price in 0i64..10_000,
            stock_in in 0i64..1_000,
            stock_out in 0i64..1_000,
        ) {
            let s = stock(price, None, stock_in, stock_out);
            prop_assert!(s.remaining() >= 0);
            prop_assert!(s.value_at_cost() >= Decimal::ZERO);
            prop_assert_eq!(s.remaining(), (stock_in - stock_out).max(0));
        }
    }
}
