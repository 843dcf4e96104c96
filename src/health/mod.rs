//! Liveness probe.
//!
//! `GET /health/` always answers 200 with a fixed-shape body. It reads no
//! configuration and touches no store, so it cannot fail and never reveals
//! whether debug mode is on.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Toolchain version the gateway declares, reported in the probe body.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    /// Field name kept for existing deployment probes.
    #[serde(rename = "python_version")]
    pub runtime_version: &'static str,
    pub debug_mode: bool,
}

impl HealthReport {
    pub fn current() -> Self {
        Self {
            status: "healthy",
            message: "EquipSense Backend is running",
            runtime_version: RUNTIME_VERSION,
            debug_mode: false,
        }
    }
}

pub async fn health_check() -> Json<HealthReport> {
    Json(HealthReport::current())
}

pub fn health_routes() -> Router {
    Router::new().route("/health/", get(health_check))
}
