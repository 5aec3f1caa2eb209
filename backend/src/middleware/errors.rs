//! Records server failures in the audit trail

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::{AuditAction, AuditEvent};

use crate::error::ServerFailure;
use crate::AppState;

pub async fn record_server_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let (parts, body) = request.into_parts();
    let ip_address = super::auth::client_ip(&parts);
    let user_agent = parts
        .headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let response = next.run(Request::from_parts(parts, body)).await;

    if let Some(ServerFailure(message)) = response.extensions().get::<ServerFailure>() {
        let mut event = AuditEvent::anonymous(
            AuditAction::Error,
            "system",
            format!("{} {}: {}", method, path, message),
        );
        event.ip_address = ip_address;
        event.user_agent = user_agent;
        state.audit.record(event).await;
    }

    response
}
