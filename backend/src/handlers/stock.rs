//! Stock-in and stock-out handlers
//!
//! Both ledgers share these handlers; the router attaches the direction as a
//! request extension.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{Direction, LedgerFilter, MovementInput, PriceSnapshot, ProductLookup, StockMovement};
use uuid::Uuid;

use super::parse_date;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{MovementList, StockLedgerService};
use crate::AppState;

fn service(state: &AppState) -> StockLedgerService {
    StockLedgerService::new(
        state.ledger.clone(),
        state.audit.clone(),
        state.config.inventory.clone(),
    )
}

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub search: Option<String>,
    pub product_id: Option<Uuid>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<u32>,
}

impl MovementQuery {
    fn filter(&self) -> LedgerFilter {
        LedgerFilter {
            date_from: parse_date(self.date_from.as_deref()),
            date_to: parse_date(self.date_to.as_deref()),
            product_id: self.product_id,
            created_by: None,
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
}

pub async fn list_movements(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<MovementList>> {
    let list = service(&state)
        .list(&actor, direction, query.filter(), query.page, Utc::now().date_naive())
        .await?;
    Ok(Json(list))
}

pub async fn create_movement(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<MovementInput>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    let movement = service(&state).record(&actor, direction, input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn update_movement(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<MovementInput>,
) -> AppResult<Json<StockMovement>> {
    let movement = service(&state).update(&actor, direction, id, input).await?;
    Ok(Json(movement))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete(&actor, direction, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product picker for the entry forms
pub async fn search_products(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ProductSearchQuery>,
) -> AppResult<Json<Vec<ProductLookup>>> {
    let products = service(&state)
        .search_products(&actor, direction, query.q.as_deref())
        .await?;
    Ok(Json(products))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Extension(direction): Extension<Direction>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PriceSnapshot>> {
    Ok(Json(service(&state).snapshot(&actor, direction, id).await?))
}
