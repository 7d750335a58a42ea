use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::extractor::{bearer_token, Actor};
use crate::auth::policy::{authorize, Access, RouteId};
use crate::error::AppError;
use crate::state::SharedState;

/// Enforce the matched route's access rule before its handler runs.
///
/// On success the verified [`Actor`] is attached to the request extensions.
pub async fn require_access(
    State(state): State<SharedState>,
    matched: MatchedPath,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // HEAD is served by the GET handler.
    let method = if req.method() == Method::HEAD {
        Method::GET
    } else {
        req.method().clone()
    };
    let route = RouteId::resolve(method.as_str(), matched.as_str()).ok_or_else(|| {
        AppError::Internal(format!(
            "No access rule for {method} {}",
            matched.as_str()
        ))
    })?;

    let required = match route.access() {
        Access::Public => return Ok(next.run(req).await),
        Access::Authenticated(roles) => roles,
    };

    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!(?route, "Rejected bearer token: {e}");
        AppError::from(e)
    })?;

    if !authorize(claims.role, required) {
        tracing::warn!(?route, user_id = %claims.id, role = %claims.role, "Role not permitted");
        return Err(AppError::Forbidden(
            "You do not have permission to access this resource".to_string(),
        ));
    }

    req.extensions_mut().insert(Actor::from(claims));
    Ok(next.run(req).await)
}
