//! Jupyter notebooks (nbformat 4): JSON → cells → canvas.
//!
//! Markdown cells are drawn bold, code cells monospace, raw cells plain.
//! Code-cell outputs follow their cell in grey monospace; PNG and JPEG
//! outputs (plots) are embedded as images.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pdf::{Canvas, Font, Rgb, TextStyle};
use crate::pipeline::encode::PdfImage;
use crate::pipeline::text::{clean_markdown, clean_output};
use crate::pipeline::Rendered;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Markdown,
    Code,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    /// Encoded image bytes (PNG or JPEG).
    Image(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

// ── JSON model ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawNotebook {
    cells: Option<Vec<RawCell>>,
    nbformat: Option<u32>,
}

#[derive(Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: MultiLine,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Deserialize)]
struct RawOutput {
    output_type: String,
    text: Option<MultiLine>,
    data: Option<HashMap<String, MultiLine>>,
    ename: Option<String>,
    evalue: Option<String>,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum MultiLine {
    One(String),
    Many(Vec<String>),
    Other(Value),
}

impl Default for MultiLine {
    fn default() -> Self {
        MultiLine::One(String::new())
    }
}

impl MultiLine {
    fn joined(self) -> String {
        match self {
            MultiLine::One(s) => s,
            MultiLine::Many(lines) => lines.concat(),
            // JSON outputs (application/json) and the like.
            MultiLine::Other(v) => v.to_string(),
        }
    }
}

/// Parse notebook JSON.
pub fn parse(bytes: &[u8]) -> Result<Notebook, ConvertError> {
    let raw: RawNotebook =
        serde_json::from_slice(bytes).map_err(|e| ConvertError::Notebook(e.to_string()))?;
    if let Some(v) = raw.nbformat.filter(|v| *v < 4) {
        return Err(ConvertError::Notebook(format!(
            "nbformat {v} is not supported (expected 4)"
        )));
    }
    let Some(raw_cells) = raw.cells else {
        return Err(ConvertError::Notebook("missing 'cells' array".to_string()));
    };

    let cells = raw_cells
        .into_iter()
        .map(|raw| {
            let kind = match raw.cell_type.as_str() {
                "markdown" => CellKind::Markdown,
                "code" => CellKind::Code,
                "raw" => CellKind::Raw,
                other => {
                    warn!("Unknown cell type '{}', drawing as raw", other);
                    CellKind::Raw
                }
            };
            let outputs = if kind == CellKind::Code {
                raw.outputs.into_iter().filter_map(convert_output).collect()
            } else {
                Vec::new()
            };
            Cell {
                kind,
                source: raw.source.joined(),
                outputs,
            }
        })
        .collect::<Vec<_>>();

    debug!("Notebook: {} cells", cells.len());
    Ok(Notebook { cells })
}

fn convert_output(raw: RawOutput) -> Option<Output> {
    match raw.output_type.as_str() {
        "stream" => raw.text.map(|t| Output::Text(t.joined())),
        "execute_result" | "display_data" => {
            let mut data = raw.data?;
            for mime in ["image/png", "image/jpeg"] {
                if let Some(encoded) = data.remove(mime) {
                    let encoded: String = encoded.joined().split_whitespace().collect();
                    match STANDARD.decode(encoded) {
                        Ok(bytes) => return Some(Output::Image(bytes)),
                        Err(e) => warn!("Undecodable {} output: {}", mime, e),
                    }
                }
            }
            data.remove("text/plain").map(|t| Output::Text(t.joined()))
        }
        "error" => Some(Output::Text(format!(
            "{}: {}",
            raw.ename.unwrap_or_default(),
            raw.evalue.unwrap_or_default()
        ))),
        _ => None,
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

pub fn lay_out(notebook: &Notebook, config: &ConversionConfig) -> Rendered {
    let (width, height) = config.page_size.dimensions();
    let mut canvas = Canvas::new(width, height, config.margin);
    let body = config.font_size;
    let markdown = TextStyle::new(Font::HelveticaBold, body);
    let code = TextStyle::new(Font::Courier, (body - 1.0).max(6.0));
    let raw = TextStyle::new(Font::Helvetica, body);
    let output = TextStyle::new(Font::Courier, (body - 2.0).max(6.0))
        .color(Rgb::GREY)
        .indent(10.0);

    let mut embedded = 0;
    let mut skipped = 0;
    for cell in &notebook.cells {
        match cell.kind {
            CellKind::Markdown => {
                let text = clean_markdown(&cell.source);
                if !text.is_empty() {
                    canvas.text_block(&text, markdown);
                }
            }
            CellKind::Code => {
                let source = cell.source.trim_end_matches(['\n', '\r']);
                if !source.is_empty() {
                    canvas.preformatted(source, code);
                }
            }
            CellKind::Raw => canvas.text_block(cell.source.trim_end(), raw),
        }

        for out in &cell.outputs {
            match out {
                Output::Text(text) => {
                    let text = clean_output(text);
                    if !text.is_empty() {
                        canvas.advance(2.0);
                        canvas.preformatted(&text, output);
                    }
                }
                Output::Image(bytes) => match PdfImage::from_bytes(bytes) {
                    Ok(image) => {
                        canvas.image(image, 0.5);
                        embedded += 1;
                    }
                    Err(e) => {
                        warn!("Skipping output image: {}", e);
                        skipped += 1;
                    }
                },
            }
        }
        canvas.advance(body * 0.8);
    }

    Rendered {
        layout: canvas.finish(),
        images_embedded: embedded,
        images_skipped: skipped,
    }
}
