//! Authentication handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{LoginInput, ProfileInput, Role, User};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{ClientOrigin, CurrentUser};
use crate::services::auth::AuthTokens;
use crate::services::{AuthService, UserService};
use crate::AppState;

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub role_label: &'static str,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), state.audit.clone(), &state.config);
    let tokens = service
        .login(body, origin.ip_address, origin.user_agent)
        .await?;
    Ok(Json(tokens))
}

/// The authenticated caller
pub async fn me(CurrentUser(actor): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: actor.user_id,
        name: actor.name,
        role: actor.role,
        role_label: actor.role.label(),
    })
}

/// Edit the caller's own account
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db.clone(), state.audit.clone());
    let user = service.update_profile(&actor, input).await?;
    Ok(Json(user))
}
