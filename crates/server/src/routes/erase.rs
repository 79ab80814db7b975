use crate::error::{ServerError, ServerResult};
use crate::middleware::Client;
use crate::state::ServerState;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use gateway::{SubmitReceipt, Submission};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use upstream::ImagePart;

/// `POST /api/erase`: multipart with an `img` and a `mask` file part.
pub async fn submit_erase(
    State(state): State<Arc<ServerState>>,
    Client(client): Client,
    mut multipart: Multipart,
) -> ServerResult<Json<SubmitReceipt>> {
    let mut image = None;
    let mut mask = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "img" && name != "mask" {
            tracing::debug!(field = %name, "ignoring unexpected multipart field");
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&state, e))?;

        let mut part = ImagePart::new(bytes);
        part.filename = filename;
        part.content_type = content_type;
        if name == "img" {
            image = Some(part);
        } else {
            mask = Some(part);
        }
    }

    let image = image.ok_or_else(|| ServerError::BadRequest("missing 'img' file part".into()))?;
    let mask = mask.ok_or_else(|| ServerError::BadRequest("missing 'mask' file part".into()))?;

    let receipt = state
        .gateway
        .submit(Submission {
            image,
            mask,
            client,
        })
        .await?;
    Ok(Json(receipt))
}

fn multipart_error(state: &ServerState, err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(state.config.max_body_size_mb)
    } else {
        ServerError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub token: String,
}

/// `POST /api/erase/status`: relays the vendor's JSON reply unmodified.
pub async fn erase_status(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let outcome = state.gateway.relay_status(&request.token).await?;
    tracing::debug!(token = %request.token, persistence = outcome.persistence.as_str(), "status relayed");
    Ok(Json(outcome.response))
}
