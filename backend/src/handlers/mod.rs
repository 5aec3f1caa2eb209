//! HTTP handlers

use chrono::NaiveDate;
use serde::Deserialize;

pub mod audit;
pub mod auth;
pub mod brands;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod reporting;
pub mod settings;
pub mod stock;
pub mod users;

pub use audit::*;
pub use auth::*;
pub use brands::*;
pub use categories::*;
pub use dashboard::*;
pub use health::*;
pub use products::*;
pub use reporting::*;
pub use settings::*;
pub use stock::*;
pub use users::*;

/// Search and page for simple listings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
}

/// Lenient `YYYY-MM-DD` parsing for query strings; blank or malformed
/// values mean "no bound".
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}
