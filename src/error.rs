//! Error types for the office2pdf library.
//!
//! Every conversion either produces a complete PDF or fails with one
//! [`ConvertError`]. Problems that only affect a single element (an embedded
//! EMF picture pdf cannot show, a slide font that is not installed) are not
//! errors: they are logged with `tracing::warn!` and counted in
//! [`crate::output::ConversionStats`].
//!
//! The HTTP layer maps these onto status codes in [`crate::server::ApiError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the office2pdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Reading or writing a file on disk failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension is not accepted for the requested document kind.
    #[error("Unsupported file extension '.{extension}' for {kind} conversion (expected one of: {expected})")]
    UnsupportedExtension {
        extension: String,
        kind: &'static str,
        expected: String,
    },

    /// The upload is not a readable Office Open XML package (zip container).
    #[error("'{name}' is not a valid {kind} package: {detail}")]
    InvalidPackage {
        name: String,
        kind: &'static str,
        detail: String,
    },

    /// A required part is absent from the package.
    #[error("Missing part '{part}' in {kind} package")]
    MissingPart { part: String, kind: &'static str },

    /// A part inflates past the per-part size limit.
    #[error("Part '{part}' exceeds {limit} bytes when decompressed")]
    PartTooLarge { part: String, limit: u64 },

    /// An XML part could not be parsed.
    #[error("Malformed XML in '{part}': {detail}")]
    Xml { part: String, detail: String },

    // ── Format errors ─────────────────────────────────────────────────────
    /// calamine could not open or read the workbook.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// The notebook JSON is malformed or does not match nbformat 4.
    #[error("Notebook error: {0}")]
    Notebook(String),

    /// An image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// lopdf failed to serialise the document.
    #[error("PDF writing failed: {0}")]
    Pdf(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Wrap an `io::Error` together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by what the caller sent rather than by the
    /// conversion itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConvertError::UnsupportedExtension { .. })
    }
}

impl From<lopdf::Error> for ConvertError {
    fn from(e: lopdf::Error) -> Self {
        ConvertError::Pdf(e.to_string())
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(e: image::ImageError) -> Self {
        ConvertError::Image(e.to_string())
    }
}

impl From<calamine::Error> for ConvertError {
    fn from(e: calamine::Error) -> Self {
        ConvertError::Spreadsheet(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_display() {
        let e = ConvertError::UnsupportedExtension {
            extension: "txt".into(),
            kind: "word",
            expected: ".docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".txt"), "got: {msg}");
        assert!(msg.contains(".docx"), "got: {msg}");
        assert!(e.is_client_error());
    }

    #[test]
    fn invalid_package_display() {
        let e = ConvertError::InvalidPackage {
            name: "deck.ppt".into(),
            kind: "PowerPoint",
            detail: "invalid Zip archive".into(),
        };
        assert!(e.to_string().contains("deck.ppt"));
        assert!(e.to_string().contains("invalid Zip archive"));
        assert!(!e.is_client_error());
    }

    #[test]
    fn io_display_includes_path() {
        let e = ConvertError::io(
            "/tmp/missing.docx",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.to_string().contains("/tmp/missing.docx"));
    }

    #[test]
    fn missing_part_display() {
        let e = ConvertError::MissingPart {
            part: "word/document.xml".into(),
            kind: "Word",
        };
        assert!(e.to_string().contains("word/document.xml"));
    }
}
