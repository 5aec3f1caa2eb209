//! Liveness and version endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: &'static str,
    pub allow_negative_stock: bool,
}

/// Reports "degraded" when the database does not answer.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_up = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    if !database_up {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if database_up { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database: if database_up { "connected" } else { "disconnected" },
        allow_negative_stock: state.config.inventory.allow_negative_stock,
    })
}

pub async fn root() -> &'static str {
    "Pamela Inventory API v1"
}
