//! WebAssembly module for the inventory entry screens
//!
//! Exposes the shared pricing rules so client-side previews on the stock-out
//! form match what the server records:
//! - Sales price / discount predicates
//! - Effective unit price of an outgoing line
//! - Per-line preview for the entry form
//! - Range totals for the stock-out listing

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::pricing;
use shared::{PricedLine, RangeTotals};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("inventory-wasm loaded"));
}

fn decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

/// Non-finite or missing values count as "no sales price".
fn sales_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(|v| Decimal::try_from(v).ok())
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn has_sales_price_set(sales_price: Option<f64>) -> bool {
    pricing::has_sales_price_set(sales_decimal(sales_price))
}

#[wasm_bindgen]
pub fn has_active_discount(unit_price: f64, unit_sales_price: Option<f64>) -> bool {
    pricing::has_active_discount(decimal(unit_price), sales_decimal(unit_sales_price))
}

/// Price charged per unit on a stock-out line
#[wasm_bindgen]
pub fn effective_unit_price(unit_price: f64, unit_sales_price: Option<f64>) -> f64 {
    to_f64(pricing::effective_unit(
        decimal(unit_price),
        sales_decimal(unit_sales_price),
    ))
}

/// Unit value used when valuing stock at sales price
#[wasm_bindgen]
pub fn sales_valuation_unit(price: f64, sales_price: Option<f64>) -> f64 {
    to_f64(pricing::sales_valuation_unit(decimal(price), sales_decimal(sales_price)))
}

/// What the stock-out form shows beside a line before it is saved
#[derive(Debug, Serialize, PartialEq)]
pub struct LinePreview {
    pub effective_unit: f64,
    pub discounted: bool,
    pub line_total: f64,
}

fn preview(quantity: i32, unit_price: f64, unit_sales_price: Option<f64>) -> LinePreview {
    let price = decimal(unit_price);
    let sales = sales_decimal(unit_sales_price);
    let unit = pricing::effective_unit(price, sales);
    LinePreview {
        effective_unit: to_f64(unit),
        discounted: pricing::has_active_discount(price, sales),
        line_total: to_f64(unit * Decimal::from(quantity)),
    }
}

/// Preview of one line as JSON
#[wasm_bindgen]
pub fn line_preview(quantity: i32, unit_price: f64, unit_sales_price: Option<f64>) -> Result<String, JsValue> {
    serde_json::to_string(&preview(quantity, unit_price, unit_sales_price))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Range totals for a JSON array of `{quantity, unit_price, unit_sales_price}`
/// lines. Returns the totals as JSON.
#[wasm_bindgen]
pub fn stock_out_range_totals(lines_json: &str) -> Result<String, JsValue> {
    let totals = range_totals(lines_json).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Same as [`stock_out_range_totals`], taking the lines as a JS array.
#[wasm_bindgen]
pub fn range_totals_of(lines: &JsValue) -> Result<String, JsValue> {
    let json: String = js_sys::JSON::stringify(lines)?.into();
    stock_out_range_totals(&json)
}

fn range_totals(lines_json: &str) -> Result<RangeTotals, String> {
    let lines: Vec<PricedLine> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid lines JSON: {}", e))?;
    Ok(RangeTotals::from_lines(lines))
}
