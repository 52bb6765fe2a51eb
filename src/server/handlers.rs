//! Route handlers.
//!
//! Each conversion route runs the same sequence: read the upload, check the
//! extension, save it into a fresh workspace, convert, write
//! `converted.pdf`, answer, and clean the workspace up whatever happened.

use crate::error::ConvertError;
use crate::format::DocumentKind;
use crate::server::error::ApiError;
use crate::server::upload::{read_file_field, Upload};
use crate::server::AppState;
use crate::workspace::{RequestWorkspace, OUTPUT_FILE_NAME};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

pub async fn index() -> String {
    let mut banner = format!(
        "office2pdf {}\n\nPOST a multipart form with a `file` field to:\n",
        env!("CARGO_PKG_VERSION")
    );
    for kind in DocumentKind::ALL {
        let extensions = kind
            .extensions()
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(" ");
        banner.push_str(&format!("  /convert/{:<14} {}\n", kind.route_slug(), extensions));
    }
    banner
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn word_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(state, DocumentKind::Word, multipart).await
}

pub async fn excel_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(state, DocumentKind::Excel, multipart).await
}

pub async fn ipynb_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(state, DocumentKind::Notebook, multipart).await
}

pub async fn ppt_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(state, DocumentKind::PowerPoint, multipart).await
}

async fn convert_upload(
    state: AppState,
    kind: DocumentKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let upload = read_file_field(multipart).await?;
    kind.check_extension(&upload.file_name)?;

    let workspace = RequestWorkspace::create(&state.config.temp_root, &upload.file_name)?;
    let result = convert_in(&state, kind, &workspace, upload).await;
    workspace
        .cleanup(
            state.config.cleanup_attempts,
            Duration::from_millis(state.config.cleanup_delay_ms),
        )
        .await;

    let pdf = result?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{OUTPUT_FILE_NAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

async fn convert_in(
    state: &AppState,
    kind: DocumentKind,
    workspace: &RequestWorkspace,
    upload: Upload,
) -> Result<Vec<u8>, ApiError> {
    let input = workspace.input_path();
    tokio::fs::write(input, &upload.bytes)
        .await
        .map_err(|e| ConvertError::io(input, e))?;

    let output = state.converter.convert_path(input, Some(kind)).await?;

    let out_path = workspace.output_path();
    tokio::fs::write(out_path, &output.pdf)
        .await
        .map_err(|e| ConvertError::io(out_path, e))?;
    info!(
        "{} → {} ({} pages, {} bytes)",
        upload.file_name, OUTPUT_FILE_NAME, output.stats.page_count, output.stats.output_bytes
    );
    Ok(output.pdf)
}
