//! HTTP API.
//!
//! ```text
//! GET  /                        plain-text banner
//! GET  /health                  {"status":"ok","version":…}
//! POST /convert/word-to-pdf     multipart `file` → application/pdf
//! POST /convert/excel-to-pdf
//! POST /convert/ipynb-to-pdf
//! POST /convert/ppt-to-pdf
//! ```
//!
//! Handlers share nothing mutable: the converter and server settings are
//! read-only behind `Arc`s, and each request works in its own scratch
//! directory.

pub mod error;
pub mod handlers;
pub mod upload;

pub use error::ApiError;

use crate::config::{ConversionConfig, ServerConfig};
use crate::convert::Converter;
use crate::error::ConvertError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(conversion: ConversionConfig, server: ServerConfig) -> Self {
        Self {
            converter: Arc::new(Converter::new(conversion)),
            config: Arc::new(server),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/convert/word-to-pdf", post(handlers::word_to_pdf))
        .route("/convert/excel-to-pdf", post(handlers::excel_to_pdf))
        .route("/convert/ipynb-to-pdf", post(handlers::ipynb_to_pdf))
        .route("/convert/ppt-to-pdf", post(handlers::ppt_to_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Bind `server.bind` and serve until Ctrl-C.
pub async fn serve(conversion: ConversionConfig, server: ServerConfig) -> Result<(), ConvertError> {
    tokio::fs::create_dir_all(&server.temp_root)
        .await
        .map_err(|e| ConvertError::io(&server.temp_root, e))?;
    let bind = server.bind;
    let state = AppState::new(conversion, server);
    if !state.converter.rasterises_slides() {
        info!("Slides will be drawn as vector text");
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| ConvertError::Internal(format!("Cannot bind {bind}: {e}")))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConvertError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
