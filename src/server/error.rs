use crate::error::ConvertError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers. Every variant renders as
/// `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing file field, empty filename, empty upload, malformed multipart.
    #[error("{message}")]
    BadRequest { message: String },

    /// The request body exceeded the configured upload limit.
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// The conversion itself failed.
    #[error(transparent)]
    Conversion(#[from] ConvertError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conversion(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Conversion failed: {:#}", self);
        } else {
            tracing::debug!("Client error ({}): {}", status.as_u16(), self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::bad_request("No file part").status_code(),
            StatusCode::BAD_REQUEST
        );
        let wrong_ext = ConvertError::UnsupportedExtension {
            extension: "txt".into(),
            kind: "Word",
            expected: ".docx".into(),
        };
        assert_eq!(
            ApiError::from(wrong_ext).status_code(),
            StatusCode::BAD_REQUEST
        );
        let broken = ConvertError::Notebook("missing 'cells' array".into());
        assert_eq!(
            ApiError::from(broken).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conversion_message_is_passed_through() {
        let err = ApiError::from(ConvertError::Pdf("boom".into()));
        assert_eq!(err.to_string(), "PDF writing failed: boom");
    }
}
