//! Pamela Inventory - backend server library
//!
//! Product catalog, stock-in/stock-out ledger with price snapshots,
//! valuation, reporting and the audit trail behind an axum HTTP API.

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use services::AuditSink;
use store::LedgerStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub ledger: Arc<dyn LedgerStore>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// State backed by PostgreSQL for both the ledger and the audit trail.
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        Self {
            ledger: Arc::new(store::PgLedgerStore::new(db.clone())),
            audit: Arc::new(services::PgAuditSink::new(db.clone())),
            db,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::record_server_errors,
                )),
        )
        .layer(cors)
        .with_state(state)
}
