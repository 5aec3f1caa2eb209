//! User management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{PaginatedResponse, Pagination, User, UserInput};
use uuid::Uuid;

use super::ListQuery;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::UserService;
use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let service = UserService::new(state.db.clone(), state.audit.clone());
    let pagination = Pagination::new(query.page, state.config.inventory.list_page_size);
    let users = service
        .list(&actor, query.search.as_deref(), pagination)
        .await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<UserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    let service = UserService::new(state.db.clone(), state.audit.clone());
    let user = service.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UserInput>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db.clone(), state.audit.clone());
    let user = service.update(&actor, id, input).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = UserService::new(state.db.clone(), state.audit.clone());
    service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
