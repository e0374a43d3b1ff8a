//! Access-token verification for protected routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::AppState;
use super::error::ApiError;

/// Require `Authorization: Bearer <access token>`.
///
/// Missing or malformed header is 401; a token that fails verification is
/// 403. On success the [`AccessClaims`](crate::auth::AccessClaims) are
/// inserted into the request extensions.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let claims = state.jwt.verify_access(token).map_err(|e| {
        warn!(
            kind = e.kind(),
            token_len = token.len(),
            path = %req.uri().path(),
            "Access token rejected"
        );
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
