//! Liveness and readiness endpoints.

use axum::Json;
use serde::Serialize;

/// Health payload.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always "ok" when the process is serving
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Liveness probe.
pub async fn health_check() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// Readiness probe.
///
/// The server wires its stores at startup and refuses to boot without
/// them, so readiness mirrors liveness here.
pub async fn readiness_check() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}
