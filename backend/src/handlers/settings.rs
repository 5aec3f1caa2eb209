//! Company settings handlers

use axum::{extract::State, Json};
use shared::{CompanySettings, CompanySettingsInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::SettingsService;
use crate::AppState;

pub async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<CompanySettings>> {
    let service = SettingsService::new(state.db.clone(), state.audit.clone());
    Ok(Json(service.show(&actor).await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CompanySettingsInput>,
) -> AppResult<Json<CompanySettings>> {
    let service = SettingsService::new(state.db.clone(), state.audit.clone());
    Ok(Json(service.update(&actor, input).await?))
}
