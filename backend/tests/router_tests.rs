//! HTTP routing tests: the auth layer and error envelopes through the full router
//!
//! Every request here is refused before the database is reached, so the pool
//! is created lazily and never connects.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use inventory_server::config::{
    Config, DatabaseConfig, ExportConfig, InventoryConfig, JwtConfig, LanConfig, ServerConfig,
};
use inventory_server::services::auth::Claims;
use inventory_server::{create_app, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use shared::Role;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "router-test-secret";

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/inventory_unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            access_token_expiry: 3600,
        },
        inventory: InventoryConfig::default(),
        export: ExportConfig {
            font_dir: "./fonts".to_string(),
            font_family: "LiberationSans".to_string(),
        },
        lan: LanConfig::default(),
        bootstrap: Default::default(),
    }
}

fn app() -> Router {
    let config = test_config();
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    create_app(AppState::new(db, config))
}

fn token(role: Role) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        name: format!("{} user", role.label()),
        role,
        iat: now,
        exp: now + 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn request(method: Method, uri: &str, role: Option<Role>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(role)));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (status, body) = send(request(Method::GET, "/api/v1/auth/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let req = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_echoes_token_identity() {
    let (status, body) = send(request(Method::GET, "/api/v1/auth/me", Some(Role::Cashier), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_label"], Role::Cashier.label());
}

#[tokio::test]
async fn test_cashier_cannot_browse_audit_logs() {
    let (status, body) = send(request(Method::GET, "/api/v1/audit-logs", Some(Role::Cashier), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_report_tab_is_unprocessable() {
    let (status, body) = send(request(Method::GET, "/api/v1/reports/bogus", Some(Role::Admin), None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "tab");
}

#[tokio::test]
async fn test_profile_edit_requires_matching_confirmation() {
    let body = json!({
        "name": "Counter One",
        "username": "counter1",
        "password": "secret123",
        "password_confirmation": "secret124",
    });
    let (status, body) = send(request(Method::PUT, "/api/v1/auth/me", Some(Role::Cashier), Some(body))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "password");
}

#[tokio::test]
async fn test_profile_edit_validates_fields() {
    let body = json!({ "name": "", "username": "counter1" });
    let (status, body) = send(request(Method::PUT, "/api/v1/auth/me", Some(Role::WarehouseStaff), Some(body))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "name");
}
