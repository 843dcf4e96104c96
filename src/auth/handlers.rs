//! Token lifecycle endpoints under `/api/auth/`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::TokenService;
use crate::http::error::GatewayError;
use crate::observability::metrics;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Token endpoints. Paths are absolute; the router is mounted as-is.
pub fn token_routes(tokens: Arc<TokenService>) -> Router {
    Router::new()
        .route("/api/auth/token/refresh/", post(refresh))
        .route("/api/auth/token/verify/", post(verify))
        .route("/api/auth/logout/", post(logout))
        .with_state(tokens)
}

async fn refresh(
    State(tokens): State<Arc<TokenService>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, GatewayError> {
    let access = tokens.refresh(&body.refresh).await.map_err(|e| {
        tracing::debug!(reason = %e, "Refresh rejected");
        metrics::record_auth_rejection(e.reason());
        GatewayError::Unauthenticated
    })?;
    Ok(Json(RefreshResponse { access }))
}

async fn verify(
    State(tokens): State<Arc<TokenService>>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    tokens.validate_any(&body.token).await.map_err(|e| {
        tracing::debug!(reason = %e, "Verify rejected");
        GatewayError::Unauthenticated
    })?;
    Ok(Json(serde_json::json!({})))
}

async fn logout(
    State(tokens): State<Arc<TokenService>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Response, GatewayError> {
    tokens.revoke(&body.refresh).await.map_err(|e| {
        tracing::debug!(reason = %e, "Logout rejected");
        GatewayError::Unauthenticated
    })?;
    Ok(StatusCode::RESET_CONTENT.into_response())
}
