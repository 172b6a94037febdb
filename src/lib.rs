use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access rules and the client-side runtime that applies them.
pub mod access;
pub mod guard;
pub mod controller;
pub mod navigation;
pub mod session;
pub mod token;

// Collaborators and ambient concerns.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;

// The access-policy HTTP service.
pub mod handlers;
pub mod routes;
use auth::BearerToken;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use api::{HttpSessionValidator, MockSessionValidator, SessionValidator, ValidatorState};
pub use config::AppConfig;
pub use controller::{Outcome, RouteAccessController};
pub use error::PortalError;
pub use models::{Role, Session};
pub use navigation::Navigator;
pub use session::SessionStore;
pub use token::{FileTokenStore, MemoryTokenStore, TokenState, TokenStore};

/// ApiDoc
///
/// OpenAPI document for the access-policy service, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // Handlers carrying `#[utoipa::path]`.
    paths(
        handlers::health, handlers::get_route_sets, handlers::evaluate_access,
        handlers::validate_session
    ),
    // Request and response bodies.
    components(
        schemas(
            models::Session, models::EvaluateRequest, models::AccessDecision,
            models::DecisionOutcome, models::RouteSets, models::ValidatedProfile,
            models::ValidateSessionResponse, access::RouteClass,
        )
    ),
    tags(
        (name = "schoolmule-portal", description = "SchoolMule route access policy")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the configuration and the session validation
/// service the authenticated routes forward to.
#[derive(Clone)]
pub struct AppState {
    pub validator: ValidatorState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull only the piece of AppState they need.
impl FromRef<AppState> for ValidatorState {
    fn from_ref(app_state: &AppState) -> ValidatorState {
        app_state.validator.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// Rejects requests without a bearer credential before they reach a handler.
async fn bearer_middleware(_token: BearerToken, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routes, applies the bearer check to the authenticated scope and
/// wraps everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The front end is served from another origin.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: health, route tables and access evaluation.
        .merge(public::public_routes())
        // Authenticated Routes: a missing or blank bearer is a 401 before any handler runs.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn(bearer_middleware)),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged by `trace_span_logger`.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the caller.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Used by `TraceLayer` to build the span for one HTTP request. It carries the
/// `x-request-id` set above alongside the method and URI, so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // Structured fields picked up by both the pretty and JSON formatters.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
