//! Multipart extraction of the uploaded `file` field.

use crate::server::error::ApiError;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tracing::debug;

/// Name of the form field carrying the document.
pub const FILE_FIELD: &str = "file";

/// One uploaded document.
#[derive(Debug)]
pub struct Upload {
    /// Client-supplied file name, unsanitised.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Pull the `file` field out of the request. Other fields are ignored.
pub async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart
        .map_err(|e| ApiError::bad_request(format!("Expected a multipart form upload: {e}")))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring form field {:?}", field.name());
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request(format!("Uploaded file '{file_name}' is empty")));
        }
        debug!("Received '{}' ({} bytes)", file_name, bytes.len());
        return Ok(Upload { file_name, bytes });
    }

    Err(ApiError::bad_request("No file part in the request"))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge {
            message: format!("Upload too large: {}", e.body_text()),
        }
    } else {
        ApiError::bad_request(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}
