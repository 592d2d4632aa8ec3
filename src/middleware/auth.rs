use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::verify_jwt;
use crate::authz::Principal;
use crate::error::ApiError;

/// Bearer-token session resolver. A missing or invalid token on a
/// protected route is a normal 401 outcome, never a fault.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;

    let claims = verify_jwt(&token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(claims.principal());
    Ok(next.run(request).await)
}

/// Resolver variant for public routes that personalize when a session
/// exists: inserts a Principal when the token verifies, continues
/// anonymously otherwise.
pub async fn optional_auth(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Ok(token) = extract_bearer(&headers) {
        if let Ok(claims) = verify_jwt(&token) {
            request.extensions_mut().insert(claims.principal());
        }
    }
    next.run(request).await
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

// Handlers never assume a resolved session exists: the extractor turns an
// absent Principal into a 401, and MaybePrincipal makes "no session" an
// ordinary value for routes that allow it.

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybePrincipal {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
