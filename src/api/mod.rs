mod webhook;

use webhook::deploy_webhook;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Single-route router serving the webhook at `path`.
pub fn router(path: &str, state: AppState) -> Router {
    Router::new()
        .route(path, post(deploy_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
