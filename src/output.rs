//! Result types returned by a conversion.

use crate::format::DocumentKind;
use serde::{Deserialize, Serialize};

/// A finished PDF and what it took to make it.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The complete PDF file.
    pub pdf: Vec<u8>,
    pub stats: ConversionStats,
}

/// Summary of a single conversion.
///
/// Serialised as JSON by `office2pdf convert --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub kind: DocumentKind,
    /// Pages in the output PDF (never 0).
    pub page_count: usize,
    pub input_bytes: usize,
    pub output_bytes: usize,
    /// Pictures placed in the output. Raster slides count as images.
    pub images_embedded: usize,
    /// Pictures that could not be decoded (EMF, WMF, corrupt data).
    pub images_skipped: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialise_with_lowercase_kind() {
        let stats = ConversionStats {
            kind: DocumentKind::PowerPoint,
            page_count: 3,
            input_bytes: 10,
            output_bytes: 20,
            images_embedded: 3,
            images_skipped: 0,
            duration_ms: 5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["kind"], "powerpoint");
        assert_eq!(json["page_count"], 3);
    }
}
