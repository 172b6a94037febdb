use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that carry no credentials. Evaluation is stateless: the caller sends
/// its own path, token presence and session and receives a decision.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(handlers::health))
        // GET /routes
        // The public paths, parent prefixes and admin prefix used by the rules.
        .route("/routes", get(handlers::get_route_sets))
        // POST /access/evaluate
        // One pass of the access rules: render, redirect or pending.
        .route("/access/evaluate", post(handlers::evaluate_access))
}
