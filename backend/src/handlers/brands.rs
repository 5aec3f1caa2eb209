//! Brand handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Brand, BrandInput};
use uuid::Uuid;

use super::ListQuery;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::BrandService;
use crate::AppState;

pub async fn list_brands(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Brand>>> {
    let service = BrandService::new(state.db.clone(), state.audit.clone());
    let brands = service.list(&actor, query.search.as_deref()).await?;
    Ok(Json(brands))
}

pub async fn create_brand(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<BrandInput>,
) -> AppResult<(StatusCode, Json<Brand>)> {
    let service = BrandService::new(state.db.clone(), state.audit.clone());
    let brand = service.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn update_brand(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BrandInput>,
) -> AppResult<Json<Brand>> {
    let service = BrandService::new(state.db.clone(), state.audit.clone());
    let brand = service.update(&actor, id, input).await?;
    Ok(Json(brand))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = BrandService::new(state.db.clone(), state.audit.clone());
    service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
