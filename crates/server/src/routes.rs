//! HTTP router, request deadline and cross-origin policy.

use crate::error::ApiError;
use crate::handlers;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// # Arguments
/// * `state` - Shared handler state
/// * `request_timeout` - Deadline after which a request and its store calls are dropped
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/world-routes", get(handlers::world_routes))
        .route("/local-routes", get(handlers::local_routes))
        .route("/poi", get(handlers::pois))
        .route("/participants", get(handlers::participants))
        .route("/map-config", get(handlers::map_config))
        .route("/participants/:id/routes", get(handlers::participant_routes))
        .route("/participants/:id/pois", get(handlers::participant_pois));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health).head(handlers::health_head))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn_with_state(request_timeout, deadline))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors))
}

// Dropping the inner future cancels any store calls still in flight.
async fn deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout(limit).into_response(),
    }
}

// Public read-only dataset: every origin is allowed.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
