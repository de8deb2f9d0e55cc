use validator::Validate;

use crate::api::errors::ApiError;
use crate::services::storage::file_extension;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

pub(crate) fn validate_upload(
    filename: &str,
    size: usize,
    allowed_extensions: &[String],
    max_upload_size_mb: u64,
) -> Result<(), ApiError> {
    let extension = file_extension(filename)
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    if size == 0 {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }

    let max_bytes = max_upload_size_mb.saturating_mul(1024 * 1024);
    if size as u64 > max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds the {max_upload_size_mb} MB limit"
        )));
    }

    Ok(())
}

/// Trims and drops empty strings from optional query filters.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
