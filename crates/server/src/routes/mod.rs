//! API route handlers
//!
//! - `erase`: erase submission and status relay
//! - `history`: local audit records
//! - `health`: liveness, readiness and metrics

pub mod erase;
pub mod health;
pub mod history;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /, no authentication).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "wmgate",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/erase",
            "POST /api/erase/status",
            "GET /api/history",
            "GET /api/history/stats",
            "GET /api/history/{token}",
            "GET /api/history/{token}/image",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
