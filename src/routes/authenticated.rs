use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes the `BearerToken` extractor, which rejects requests
/// without a bearer credential before the handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /session/validate
        // Restores a session from a durable token via the SchoolMule API.
        .route("/session/validate", get(handlers::validate_session))
}
