//! Dashboard handler

use axum::{extract::State, Json};
use chrono::Utc;
use shared::Dashboard;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ValuationService;
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Dashboard>> {
    let service = ValuationService::new(state.ledger.clone());
    let dashboard = service.dashboard(&actor, Utc::now().date_naive()).await?;
    Ok(Json(dashboard))
}
