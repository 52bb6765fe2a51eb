//! # office2pdf
//!
//! Convert office documents (Word, Excel, PowerPoint, Jupyter notebooks) to
//! PDF, either through the library API or a small HTTP service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload / file
//!  │
//!  ├─ 1. Validate  extension must match the route's document kind
//!  ├─ 2. Parse     zip + XML (docx, pptx), calamine (spreadsheets), serde (ipynb)
//!  ├─ 3. Lay out   paginated canvas: wrapping, page breaks, cells, images
//!  ├─ 4. Render    slides → bitmaps via imageproc (concurrent, spawn_blocking)
//!  └─ 5. Write     lopdf document with standard-14 fonts and image XObjects
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use office2pdf::{convert_path, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_path("quarterly.xlsx", &config).await?;
//!     std::fs::write("quarterly.pdf", &output.pdf)?;
//!     eprintln!("{} pages", output.stats.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## HTTP service
//!
//! [`server::router`] builds the axum router; `office2pdf serve` runs it.
//! Each route takes a multipart `file` field and answers with
//! `converted.pdf` or `{"error": "…"}`.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `office2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! office2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod server;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize, ServerConfig, SlideRendering};
pub use convert::{convert_bytes, convert_path, convert_sync, convert_to_file, Converter};
pub use error::ConvertError;
pub use format::DocumentKind;
pub use output::{ConversionOutput, ConversionStats};
pub use server::{router, serve, AppState};
