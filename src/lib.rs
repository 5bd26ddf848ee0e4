pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/barista/:action", post(handlers::assistant::barista_action))
        .route("/images/generate", post(handlers::assistant::generate_image));

    Router::new()
        .route("/health", get(handlers::health::liveness))
        .route("/ready", get(handlers::health::readiness))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
