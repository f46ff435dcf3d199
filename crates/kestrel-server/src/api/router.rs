//! Router creation
//!
//! Health endpoints are open; everything else runs behind the tenant
//! middleware. CORS, HTTP tracing, id propagation, and panic recovery wrap
//! the whole router.

use super::handlers;
use super::middleware::{tenant_middleware, tracing_middleware};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the REST API router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/evaluate", post(handlers::evaluate))
        .route("/evaluations/{id}", get(handlers::get_evaluation))
        .route("/transactions/{id}", get(handlers::get_transaction))
        .route("/rules", get(handlers::list_rules).post(handlers::create_rule))
        .route("/rules/reload", post(handlers::reload_rules))
        .route("/rules/{id}", get(handlers::get_rule))
        .route(
            "/typologies",
            get(handlers::list_typologies).post(handlers::create_typology),
        )
        .route("/typologies/reload", post(handlers::reload_typologies))
        .route(
            "/typologies/{id}",
            get(handlers::get_typology)
                .put(handlers::update_typology)
                .delete(handlers::delete_typology),
        )
        .layer(middleware::from_fn(tenant_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .merge(api)
        .with_state(state)
        .layer(middleware::from_fn(tracing_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Uncaught handler faults surface as a generic 500.
fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("panic recovered in request handler");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}
