//! Request middleware and extractors

pub mod auth;
pub mod errors;

pub use auth::{auth_middleware, AuthUser, ClientOrigin, CurrentUser};
pub use errors::record_server_errors;
