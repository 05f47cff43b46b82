use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::errors::AppError;
use crate::models::{ErrorBody, UpstreamReply, ALLOWED_METHODS, DEFAULT_CONTENT_TYPE};
use crate::service::proxy_service::ProxyService;

// ── Handlers ─────────────────────────────────────────────────────────────────

/// OPTIONS `/api/chat` — preflight, answered regardless of configuration
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// GET `/api/chat` — liveness plus which settings are present.
/// axum routes HEAD here too; it is not one of the advertised methods.
pub async fn health_handler(method: Method, State(svc): State<ProxyService>) -> Response {
    if method == Method::HEAD {
        return method_not_allowed_handler(method).await;
    }
    Json(svc.health()).into_response()
}

/// POST `/api/chat` — forward the event to the webhook and relay its answer
pub async fn forward_handler(State(svc): State<ProxyService>, body: Bytes) -> Response {
    match svc.forward(&body).await {
        Ok(reply) => relay_response(reply),
        Err(err) => error_response(&err),
    }
}

/// Any other method on `/api/chat`
pub async fn method_not_allowed_handler(method: Method) -> Response {
    warn!("Rejected {method} on /api/chat");
    error_response(&AppError::MethodNotAllowed { method: method.to_string() })
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn relay_response(reply: UpstreamReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = HeaderValue::from_str(&reply.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut resp = Response::new(Body::from(reply.body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(CONTENT_TYPE, content_type);
    resp
}

/// Maps an error to the fixed body the browser sees. Only `MissingConfig`
/// carries detail, and that detail is variable names, never values.
fn error_response(err: &AppError) -> Response {
    match err {
        AppError::MissingConfig { missing } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: "Missing env vars",
                missing: Some(missing.clone()),
            }),
        )
            .into_response(),
        AppError::MethodNotAllowed { .. } => {
            let mut resp = (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorBody::new("Method Not Allowed")),
            )
                .into_response();
            resp.headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            resp
        }
        e if e.is_upstream() => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Proxy failed")),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Internal error")),
        )
            .into_response(),
    }
}
