//! Catalog models: brands, categories and products

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_non_negative_price;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub sort_order: Option<i32>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category listing row with the number of child categories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub sort_order: Option<i32>,
    pub child_categories_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChildCategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub sort_order: Option<i32>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog product. `price` and `sales_price` are the live prices; ledger
/// entries freeze them into a snapshot at recording time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub brand_id: Uuid,
    pub category_id: Uuid,
    pub child_category_id: Option<Uuid>,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product search hit used when picking a product for a stock movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductLookup {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Decimal,
    pub sales_price: Option<Decimal>,
}

impl From<&Product> for ProductLookup {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            sku: p.sku.clone(),
            barcode: p.barcode.clone(),
            price: p.price,
            sales_price: p.sales_price,
        }
    }
}

impl ProductLookup {
    /// Case-insensitive substring match on barcode, sku or name.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let hit = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&needle));
        hit(self.barcode.as_deref()) || hit(self.sku.as_deref()) || hit(Some(&self.name))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BrandInput {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChildCategoryInput {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(max = 255, message = "SKU must be at most 255 characters"))]
    pub sku: Option<String>,
    #[validate(length(max = 255, message = "Barcode must be at most 255 characters"))]
    pub barcode: Option<String>,
    pub brand_id: Uuid,
    pub category_id: Uuid,
    pub child_category_id: Option<Uuid>,
    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative_price")]
    pub sales_price: Option<Decimal>,
}

impl ProductInput {
    /// Blank optional strings are stored as NULL.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.sku = crate::validation::non_blank(self.sku);
        self.barcode = crate::validation::non_blank(self.barcode);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input(price: &str, sales: Option<&str>) -> ProductInput {
        ProductInput {
            name: "Tea".into(),
            sku: Some(" ".into()),
            barcode: None,
            brand_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            child_category_id: None,
            price: Decimal::from_str(price).unwrap(),
            sales_price: sales.map(|s| Decimal::from_str(s).unwrap()),
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(input("-1", None).validate().is_err());
        assert!(input("10", Some("-0.01")).validate().is_err());
        assert!(input("0", Some("0")).validate().is_ok());
    }

    #[test]
    fn test_blank_sku_normalized_to_none() {
        assert_eq!(input("1", None).normalized().sku, None);
    }

    #[test]
    fn test_lookup_matches_any_code() {
        let lookup = ProductLookup {
            id: Uuid::new_v4(),
            name: "Green Tea".into(),
            sku: Some("GT-01".into()),
            barcode: Some("885000".into()),
            price: Decimal::ONE,
            sales_price: None,
        };
        assert!(lookup.matches("gt-"));
        assert!(lookup.matches("8850"));
        assert!(lookup.matches("green"));
        assert!(!lookup.matches("coffee"));
    }
}
