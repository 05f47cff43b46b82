use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::models::ALLOWED_METHODS;

const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Signature";

/// CORS headers stamped on every response leaving the API, errors included,
/// so a business failure never turns into an opaque CORS failure in the browser.
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(allowed_origin: &str) -> Self {
        let allow_origin = HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| {
            warn!("ALLOWED_ORIGIN is not a valid header value, falling back to '*'");
            HeaderValue::from_static("*")
        });
        Self { allow_origin }
    }
}

pub async fn apply_cors(State(policy): State<CorsPolicy>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, policy.allow_origin.clone());
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
    response
}
