use crate::{
    AppState,
    access::{self, ADMIN_PREFIX, PARENT_PREFIXES, PUBLIC_PATHS},
    auth::BearerToken,
    error::PortalError,
    guard::GuardInput,
    models::{AccessDecision, EvaluateRequest, RouteSets, Session},
};
use axum::{Json, extract::State};

// --- Handlers ---

/// health
///
/// [Public Route] Liveness probe for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_route_sets
///
/// [Public Route] Exposes the route tables so the front end classifies paths
/// exactly like the access rules do.
#[utoipa::path(
    get,
    path = "/routes",
    responses((status = 200, description = "Route tables", body = RouteSets))
)]
pub async fn get_route_sets() -> Json<RouteSets> {
    Json(RouteSets {
        public_paths: PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        parent_prefixes: PARENT_PREFIXES.iter().map(|p| p.to_string()).collect(),
        admin_prefix: ADMIN_PREFIX.to_string(),
    })
}

/// evaluate_access
///
/// [Public Route] Runs one pass of the access rules for the supplied signals.
/// Stateless: the caller applies the returned side effects and redirect.
#[utoipa::path(
    post,
    path = "/access/evaluate",
    request_body = EvaluateRequest,
    responses((status = 200, description = "Decision for this pass", body = AccessDecision))
)]
pub async fn evaluate_access(Json(request): Json<EvaluateRequest>) -> Json<AccessDecision> {
    let input = GuardInput {
        path: &request.path,
        has_token: request.has_token,
        session: &request.session,
    };
    let decision = AccessDecision::from_pass(&input, request.hydrated);

    tracing::debug!(
        path = %request.path,
        route_class = ?access::classify(&request.path),
        outcome = ?decision.outcome,
        redirect_to = ?decision.redirect_to,
        "access evaluated"
    );
    Json(decision)
}

/// validate_session
///
/// [Authenticated Route] Forwards the caller's bearer token to the SchoolMule
/// session validation endpoint and returns the profile mapped onto a `Session`
/// (`isVerified` becomes `isVerifiedEmail`).
#[utoipa::path(
    get,
    path = "/session/validate",
    responses(
        (status = 200, description = "Session restored", body = Session),
        (status = 401, description = "Missing, expired or rejected token"),
        (status = 502, description = "Validation service unreachable")
    )
)]
pub async fn validate_session(
    BearerToken(token): BearerToken,
    State(state): State<AppState>,
) -> Result<Json<Session>, PortalError> {
    let response = state.validator.validate_session(&token).await?;
    if !response.success {
        return Err(PortalError::ValidationFailed);
    }

    let session = response
        .data
        .map(Session::from)
        .filter(Session::is_authenticated)
        .ok_or(PortalError::ValidationFailed)?;
    Ok(Json(session))
}
