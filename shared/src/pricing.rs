//! Pricing predicates shared by valuation, reports and the browser bindings
//!
//! A sales price counts as "set" only when it is present and strictly
//! positive. A discount is active when a set sales price differs from the
//! unit price.

use rust_decimal::Decimal;

/// True when a sales price is present and greater than zero.
pub fn has_sales_price_set(sales_price: Option<Decimal>) -> bool {
    matches!(sales_price, Some(p) if p > Decimal::ZERO)
}

/// True when the line sells at a price other than its unit price.
pub fn has_active_discount(unit_price: Decimal, unit_sales_price: Option<Decimal>) -> bool {
    match unit_sales_price {
        Some(sales) => sales > Decimal::ZERO && sales != unit_price,
        None => false,
    }
}

/// Price actually charged per unit on an outgoing line.
pub fn effective_unit(unit_price: Decimal, unit_sales_price: Option<Decimal>) -> Decimal {
    match unit_sales_price {
        Some(sales) if has_active_discount(unit_price, unit_sales_price) => sales,
        _ => unit_price,
    }
}

/// Unit value used for inventory valued at sales price.
pub fn sales_valuation_unit(price: Decimal, sales_price: Option<Decimal>) -> Decimal {
    match sales_price {
        Some(sales) if has_sales_price_set(sales_price) => sales,
        _ => price,
    }
}
