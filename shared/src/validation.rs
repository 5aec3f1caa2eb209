//! Validation utilities
//!
//! Field-level rules live on the input structs as `validator` attributes;
//! the helpers here cover custom rules and cross-field checks.

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::ValidationError;

use crate::error::DomainError;
use crate::models::ChildCategory;

/// Maximum number of hits returned by product search
pub const PRODUCT_SEARCH_LIMIT: usize = 10;

/// `validator` custom rule: price must be zero or positive.
pub fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

/// A child category must belong to the product's category.
pub fn validate_child_category(category_id: Uuid, child: &ChildCategory) -> Result<(), DomainError> {
    if child.category_id != category_id {
        return Err(DomainError::validation(
            "child_category_id",
            "The selected child category does not belong to the selected category",
        ));
    }
    Ok(())
}

/// Trimmed search text, or `None` when there is nothing to search for.
pub fn normalize_search(query: Option<&str>) -> Option<String> {
    query.map(str::trim).filter(|q| !q.is_empty()).map(str::to_string)
}

/// Drop blank optional strings.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Password required when creating a user.
pub fn validate_new_password(password: Option<&str>) -> Result<(), DomainError> {
    match password {
        Some(p) if p.len() >= 6 => Ok(()),
        _ => Err(DomainError::validation(
            "password",
            "Password must be at least 6 characters",
        )),
    }
}
