//! Category and child category handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Category, CategoryInput, CategorySummary, ChildCategory, ChildCategoryInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CategoryService;
use crate::AppState;

fn service(state: &AppState) -> CategoryService {
    CategoryService::new(state.db.clone(), state.audit.clone())
}

pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<CategorySummary>>> {
    Ok(Json(service(&state).list(&actor).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = service(&state).create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    Ok(Json(service(&state).update(&actor, id, input).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Child categories of one category
pub async fn list_child_categories(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Vec<ChildCategory>>> {
    Ok(Json(service(&state).children(&actor, category_id).await?))
}

pub async fn create_child_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<ChildCategoryInput>,
) -> AppResult<(StatusCode, Json<ChildCategory>)> {
    let child = service(&state).create_child(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(child)))
}

pub async fn update_child_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ChildCategoryInput>,
) -> AppResult<Json<ChildCategory>> {
    Ok(Json(service(&state).update_child(&actor, id, input).await?))
}

pub async fn delete_child_category(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete_child(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
