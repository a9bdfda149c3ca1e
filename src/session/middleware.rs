use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Rejects requests without a valid `Authorization: Bearer <jwt>` header.
/// On success the decoded `IdentityClaims` are available as an `Extension`.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let claims = state.token_config.validate_token(token).map_err(|e| {
        warn!(error = %e, "Rejected bearer token");
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    debug!(username = %claims.username, "Request authenticated");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}
