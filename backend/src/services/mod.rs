//! Business logic services for the inventory platform

pub mod audit;
pub mod auth;
pub mod barcode;
pub mod brand;
pub mod category;
pub mod export;
pub mod ledger;
pub mod network;
pub mod product;
pub mod reporting;
pub mod settings;
pub mod user;
pub mod valuation;

pub use audit::{AuditService, AuditSink, MemoryAuditSink, PgAuditSink};
pub use auth::AuthService;
pub use barcode::ProductView;
pub use brand::BrandService;
pub use category::CategoryService;
pub use ledger::{MovementList, StockLedgerService};
pub use product::{ProductFilter, ProductService};
pub use reporting::ReportingService;
pub use settings::SettingsService;
pub use user::UserService;
pub use valuation::ValuationService;
