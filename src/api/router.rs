use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_admin;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: every viewer polls these
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/api/state", get(handlers::state::get_state))
        .route("/ws", get(handlers::ws::handler));

    // Admin routes: require Bearer token when API_TOKEN is set
    let admin = Router::new()
        .route("/api/tick", post(handlers::admin::tick))
        .route("/api/reset", post(handlers::admin::reset))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
