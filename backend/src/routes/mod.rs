//! Route definitions for the inventory API

use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use shared::Direction;

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me).put(handlers::update_profile))
        .route("/dashboard", get(handlers::get_dashboard))
        .nest("/users", user_routes())
        .nest("/brands", brand_routes())
        .nest("/categories", category_routes())
        .nest("/child-categories", child_category_routes())
        .nest("/products", product_routes())
        .route("/inventory/valuation", get(handlers::get_inventory_valuation))
        .nest("/stock-ins", movement_routes(Direction::In))
        .nest("/stock-outs", movement_routes(Direction::Out))
        .nest("/reports", report_routes())
        .nest("/audit-logs", audit_routes())
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}

fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_brands).post(handlers::create_brand))
        .route(
            "/:id",
            put(handlers::update_brand).delete(handlers::delete_brand),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/:id/children", get(handlers::list_child_categories))
}

fn child_category_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_child_category))
        .route(
            "/:id",
            put(handlers::update_child_category).delete(handlers::delete_child_category),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:id/valuation", get(handlers::get_product_valuation))
}

/// Stock-in and stock-out share handlers; the direction rides along as an extension.
fn movement_routes(direction: Direction) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        .route("/products/search", get(handlers::search_products))
        .route(
            "/:id",
            put(handlers::update_movement).delete(handlers::delete_movement),
        )
        .route("/:id/snapshot", get(handlers::get_snapshot))
        .layer(Extension(direction))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/:tab", get(handlers::get_report))
        .route("/:tab/csv", get(handlers::export_report_csv))
        .route("/:tab/pdf", get(handlers::export_report_pdf))
        .route("/:tab/print", get(handlers::print_report))
}

fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_audit_logs))
        .route("/export", get(handlers::export_audit_logs))
}
