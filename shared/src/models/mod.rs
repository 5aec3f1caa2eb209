//! Domain models for the inventory platform

mod audit;
mod catalog;
mod dashboard;
mod ledger;
mod report;
mod user;

pub use audit::*;
pub use catalog::*;
pub use dashboard::*;
pub use ledger::*;
pub use report::*;
pub use user::*;
