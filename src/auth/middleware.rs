//! Bearer authentication stage.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::auth::{AuthError, TokenService, TokenType};
use crate::observability::metrics;

/// Identity attached to requests that passed bearer authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub jti: String,
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Run the full validation sequence against the request headers.
///
/// The caller turns any error into the uniform 401; the reason is recorded
/// here at debug level and as a metric label.
pub async fn authenticate_request(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthError> {
    let result = match bearer_token(headers) {
        Ok(token) => tokens.validate(token, TokenType::Access).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(claims) => Ok(AuthenticatedUser {
            user_id: claims.user_id,
            jti: claims.jti,
        }),
        Err(e) => {
            if let AuthError::Store(_) | AuthError::Internal(_) = e {
                tracing::error!(error = %e, "Token validation failed closed");
            } else {
                tracing::debug!(reason = %e, "Bearer token rejected");
            }
            metrics::record_auth_rejection(e.reason());
            Err(e)
        }
    }
}
