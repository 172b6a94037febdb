use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
};

/// BearerToken
///
/// The raw bearer credential of a request. Used by the routes that forward the
/// caller's token to the SchoolMule API; the portal never decodes it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Rejects with 401 when the `Authorization` header is missing, is not a
/// `Bearer` credential, or carries an empty token.
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(BearerToken(token.to_string()))
    }
}
