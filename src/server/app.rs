use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::api::page_routes;

use super::middleware::session_layer;
use super::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Merge page routes
        .merge(page_routes())
        // Add middleware
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        // Add state
        .with_state(state)
}
