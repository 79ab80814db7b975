use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use store::{CallStats, CallSummary};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// `GET /api/history?limit=N`: newest calls first, without image bytes.
pub async fn list_history(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HistoryQuery>,
) -> ServerResult<Json<Vec<CallSummary>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.gateway.history(limit).await?))
}

pub async fn history_stats(State(state): State<Arc<ServerState>>) -> ServerResult<Json<CallStats>> {
    Ok(Json(state.gateway.stats().await?))
}

pub async fn get_call(
    State(state): State<Arc<ServerState>>,
    Path(token): Path<String>,
) -> ServerResult<Json<CallSummary>> {
    let record = state.gateway.record(&token).await?;
    Ok(Json(record.summary()))
}

/// `GET /api/history/{token}/image`: the originally submitted image.
pub async fn get_call_image(
    State(state): State<Arc<ServerState>>,
    Path(token): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let record = state.gateway.record(&token).await?;
    let content_type = record
        .image_content_type
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    Ok(([(CONTENT_TYPE, content_type)], record.image))
}
