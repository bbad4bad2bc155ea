//! Standard middleware for the Clubhouse API.

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS for the case where the UI and API live on different origins.
/// Sessions ride in a cookie, so credentialed cross-origin calls are not
/// supported; the permissive origin only covers the read surface.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Request/response tracing with tower-http defaults: one span per
/// request, method and path as span fields.
pub fn trace_policy(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
}
