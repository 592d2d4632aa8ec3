use axum::{extract::Request, middleware::Next, response::Response};

use crate::authz::{self, Principal, Role};
use crate::error::ApiError;

/// Router-level role gate. Mounting this on a privileged router means a
/// forgotten per-handler check still denies before any handler runs.
/// Assumes `require_auth` ran earlier in the stack; if it did not, the
/// missing Principal denies with 401 rather than crashing.
pub async fn require_roles(
    request: Request,
    next: Next,
    required: &'static [Role],
) -> Result<Response, ApiError> {
    let principal = request.extensions().get::<Principal>();
    authz::require(principal, required)?;
    Ok(next.run(request).await)
}

/// Coarse gate for the staff surface; handlers declare the finer
/// per-operation role sets
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(request, next, authz::STAFF).await
}
