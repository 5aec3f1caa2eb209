//! Shared types and models for the inventory platform
//!
//! Pure domain rules (pricing, valuation, report aggregation, capability
//! checks) shared between the backend, the browser (via WASM) and tests.

pub mod error;
pub mod models;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod valuation;

pub use error::DomainError;
pub use models::*;
pub use types::*;
pub use valuation::*;
