use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::validate_upload;
use crate::core::state::AppState;
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) url: String,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/storage", post(upload_file))
}

struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_file_field(
    multipart: &mut Multipart,
    max_bytes: u64,
    max_upload_size_mb: u64,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let content_type =
            field.content_type().unwrap_or("application/octet-stream").to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::PayloadTooLarge(format!(
                    "File exceeds the {max_upload_size_mb} MB limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(UploadedFile { filename, content_type, bytes }));
    }
    Ok(None)
}

async fn upload_file(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<WebResponse<UploadResponse>>), ApiError> {
    authorize(&user, Capability::UploadFile)?;
    let storage = state
        .storage()
        .ok_or_else(|| ApiError::ServiceUnavailable("File storage is not configured".to_string()))?;

    let limits = state.settings().storage();
    let max_bytes = limits.max_upload_size_mb.saturating_mul(1024 * 1024);
    let file = read_file_field(&mut multipart, max_bytes, limits.max_upload_size_mb)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    validate_upload(
        &file.filename,
        file.bytes.len(),
        &limits.allowed_extensions,
        limits.max_upload_size_mb,
    )?;

    let stored = storage
        .upload(&file.filename, &file.content_type, file.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload file"))?;

    tracing::info!(
        user_id = %user.id,
        key = %stored.key,
        size = stored.size,
        action = "file_upload",
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("File uploaded", UploadResponse { url: stored.url })),
    ))
}
