//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Status of the server.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Health {
    /// Always `OK` while the server is able to respond.
    pub status: &'static str,

    /// Human-readable status description.
    pub message: &'static str,
}

/// `GET /api/health` handler.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "OK",
        message: "Notecraft Pro API is running",
    })
}
