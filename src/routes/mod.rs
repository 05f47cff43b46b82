pub mod api_routes;
pub mod cors;

use axum::routing::get;
use axum::{middleware, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes::api_routes::{
    forward_handler, health_handler, method_not_allowed_handler, preflight_handler,
};
use crate::routes::cors::{apply_cors, CorsPolicy};
use crate::service::proxy_service::ProxyService;

/// `/api/chat` with CORS on every response, plus the landing page from
/// `STATIC_DIR` when one is configured.
pub fn build_router(svc: ProxyService) -> Router {
    let cors = CorsPolicy::new(&svc.config().allowed_origin);
    let static_dir = svc.config().static_dir.clone();

    let api = Router::new()
        .route(
            "/api/chat",
            get(health_handler)
                .post(forward_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed_handler),
        )
        .layer(middleware::from_fn_with_state(cors, apply_cors))
        .with_state(svc);

    let app = match static_dir {
        Some(dir) => {
            info!("Serving static files from {dir}");
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
}
