//! Product catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{InventoryValuation, PaginatedResponse, Pagination, ProductInput, ProductValuation};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{ProductFilter, ProductService, ProductView, ValuationService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub page: Option<u32>,
}

pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<PaginatedResponse<ProductView>>> {
    let service = ProductService::new(state.db.clone(), state.audit.clone());
    let filter = ProductFilter {
        search: query.search,
        brand_id: query.brand_id,
        category_id: query.category_id,
    };
    let pagination = Pagination::new(query.page, state.config.inventory.list_page_size);
    let page = service.list(&actor, &filter, pagination).await?;
    Ok(Json(page.map(ProductView::from)))
}

pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductView>> {
    let service = ProductService::new(state.db.clone(), state.audit.clone());
    Ok(Json(service.get(&actor, id).await?.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<ProductView>)> {
    let service = ProductService::new(state.db.clone(), state.audit.clone());
    let product = service.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<ProductView>> {
    let service = ProductService::new(state.db.clone(), state.audit.clone());
    Ok(Json(service.update(&actor, id, input).await?.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.db.clone(), state.audit.clone());
    service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remaining stock and its value for one product
pub async fn get_product_valuation(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductValuation>> {
    let service = ValuationService::new(state.ledger.clone());
    Ok(Json(service.product_valuation(&actor, id).await?))
}

pub async fn get_inventory_valuation(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<InventoryValuation>> {
    let service = ValuationService::new(state.ledger.clone());
    Ok(Json(service.inventory_valuation(&actor).await?))
}
