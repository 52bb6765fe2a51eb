//! Word documents: `word/document.xml` → blocks → canvas.
//!
//! The body is walked once in document order. Paragraphs keep their run
//! text and style, tables become grids of cell strings, and drawings are
//! kept as relationship ids that [`read`] resolves to media bytes.
//! Everything that affects only appearance (fonts, colours, spacing,
//! section properties) is ignored.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pdf::{Canvas, Font, TextStyle};
use crate::pipeline::encode::PdfImage;
use crate::pipeline::package::Package;
use crate::pipeline::Rendered;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::{debug, warn};

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Normal,
    Title,
    /// 1..=6
    Heading(u8),
    ListItem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { text: String, style: ParagraphStyle },
    /// A picture, by relationship id.
    Image { rel_id: String },
    Table { rows: Vec<Vec<String>> },
    PageBreak,
}

#[derive(Debug, Default)]
pub struct WordDocument {
    pub blocks: Vec<Block>,
    /// Media bytes keyed by relationship id.
    pub media: HashMap<String, Vec<u8>>,
}

/// Open a `.docx` package and extract its body.
pub fn read(bytes: &[u8], name: &str) -> Result<WordDocument, ConvertError> {
    let mut package = Package::open(bytes, name, "Word")?;
    let xml = package.read_string(DOCUMENT_PART)?;
    let blocks = parse_document_xml(&xml)?;

    let rels = package.relationships(DOCUMENT_PART)?;
    let mut media = HashMap::new();
    for block in &blocks {
        let Block::Image { rel_id } = block else {
            continue;
        };
        if media.contains_key(rel_id) {
            continue;
        }
        match rels.get(rel_id) {
            Some(rel) if !rel.external => match package.read_bytes(&rel.target) {
                Ok(data) => {
                    media.insert(rel_id.clone(), data);
                }
                Err(e) => warn!("Image {} unavailable: {}", rel_id, e),
            },
            _ => warn!("Image {} has no embedded target", rel_id),
        }
    }

    debug!(
        "Word document: {} blocks, {} media parts",
        blocks.len(),
        media.len()
    );
    Ok(WordDocument { blocks, media })
}

/// Parse the main document part into blocks.
pub fn parse_document_xml(xml: &str) -> Result<Vec<Block>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut state = BodyState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"mc:Fallback" {
                    // Alternate content repeats the preferred choice.
                    let name = e.name().as_ref().to_vec();
                    reader
                        .read_to_end_into(QName(&name), &mut skip_buf)
                        .map_err(|err| xml_error(&err))?;
                    skip_buf.clear();
                } else {
                    state.start(&e, &reader);
                }
            }
            Ok(Event::Empty(e)) => state.empty(&e, &reader),
            Ok(Event::Text(e)) if state.in_text => {
                let text = e.unescape().map_err(|err| xml_error(&err))?;
                state.text(&text);
            }
            Ok(Event::End(e)) => state.end(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(state.blocks)
}

fn xml_error(e: &quick_xml::Error) -> ConvertError {
    ConvertError::Xml {
        part: DOCUMENT_PART.to_string(),
        detail: e.to_string(),
    }
}

fn attr(e: &BytesStart<'_>, reader: &Reader<&[u8]>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.decode_and_unescape_value(reader).ok())
        .map(|v| v.into_owned())
}

/// Map a paragraph style id (`Heading2`, `Title`, `heading 3`) to a style.
pub fn style_from_id(id: &str) -> ParagraphStyle {
    let normalized: String = id
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if normalized == "title" {
        return ParagraphStyle::Title;
    }
    if let Some(level) = normalized.strip_prefix("heading") {
        if let Ok(n) = level.parse::<u8>() {
            return ParagraphStyle::Heading(n.clamp(1, 6));
        }
    }
    ParagraphStyle::Normal
}

#[derive(Default)]
struct BodyState {
    blocks: Vec<Block>,

    paragraph_depth: usize,
    text: String,
    style: Option<ParagraphStyle>,
    numbered: bool,
    images: Vec<String>,
    in_text: bool,
    run_depth: usize,
    after_page_break: bool,

    table_depth: usize,
    rows: Vec<Vec<String>>,
    cell: Option<String>,
    table_images: Vec<String>,
}

impl BodyState {
    fn start(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        match e.name().as_ref() {
            b"w:p" => self.open_paragraph(),
            b"w:t" => self.in_text = true,
            b"w:r" => self.run_depth += 1,
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.rows.push(Vec::new()),
            b"w:tc" if self.table_depth == 1 => self.cell = Some(String::new()),
            b"w:numPr" => self.numbered = true,
            _ => self.empty(e, reader),
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        match e.name().as_ref() {
            b"w:pStyle" => {
                if let Some(id) = attr(e, reader, b"w:val") {
                    self.style = Some(style_from_id(&id));
                }
            }
            b"w:p" if self.paragraph_depth == 0 && self.table_depth == 0 => {
                self.blocks.push(Block::Paragraph {
                    text: String::new(),
                    style: ParagraphStyle::Normal,
                });
            }
            b"w:numPr" => self.numbered = true,
            // Tab stops in paragraph properties share the name of run tabs.
            b"w:tab" if self.run_depth > 0 => self.text.push(' '),
            b"w:cr" if self.run_depth > 0 => self.text.push('\n'),
            b"w:br" if self.run_depth > 0 => {
                if attr(e, reader, b"w:type").as_deref() == Some("page") && self.table_depth == 0 {
                    self.flush_paragraph();
                    self.blocks.push(Block::PageBreak);
                    self.after_page_break = true;
                } else {
                    self.text.push('\n');
                }
            }
            b"a:blip" => {
                if let Some(id) = attr(e, reader, b"r:embed") {
                    self.add_image(id);
                }
            }
            b"v:imagedata" => {
                if let Some(id) = attr(e, reader, b"r:id") {
                    self.add_image(id);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.paragraph_depth > 0 {
            self.text.push_str(text);
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"w:p" => self.close_paragraph(),
            b"w:tc" if self.table_depth == 1 => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.rows.last_mut()) {
                    row.push(cell.trim_end().to_string());
                }
            }
            b"w:tbl" => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    let rows = std::mem::take(&mut self.rows);
                    if rows.iter().any(|r| !r.is_empty()) {
                        self.blocks.push(Block::Table { rows });
                    }
                    for rel_id in std::mem::take(&mut self.table_images) {
                        self.blocks.push(Block::Image { rel_id });
                    }
                }
            }
            _ => {}
        }
    }

    fn open_paragraph(&mut self) {
        self.paragraph_depth += 1;
        if self.paragraph_depth == 1 {
            self.text.clear();
            self.style = None;
            self.numbered = false;
            self.after_page_break = false;
        } else if !self.text.is_empty() {
            // Text box content nested in a paragraph.
            self.text.push('\n');
        }
    }

    fn close_paragraph(&mut self) {
        self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
        if self.paragraph_depth == 0 {
            self.flush_paragraph();
        }
    }

    /// Emit the collected paragraph (into the current cell inside tables).
    fn flush_paragraph(&mut self) {
        let text = std::mem::take(&mut self.text);
        let images = std::mem::take(&mut self.images);
        if text.is_empty() && images.is_empty() && self.after_page_break {
            return;
        }

        if self.table_depth > 0 {
            if let Some(cell) = self.cell.as_mut() {
                if !cell.is_empty() && !text.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(text.trim());
            }
            self.table_images.extend(images);
            return;
        }

        let style = match self.style {
            Some(ParagraphStyle::Normal) | None if self.numbered => ParagraphStyle::ListItem,
            Some(style) => style,
            None => ParagraphStyle::Normal,
        };
        if !text.is_empty() || images.is_empty() {
            self.blocks.push(Block::Paragraph { text, style });
        }
        self.blocks
            .extend(images.into_iter().map(|rel_id| Block::Image { rel_id }));
    }

    fn add_image(&mut self, rel_id: String) {
        self.images.push(rel_id);
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Draw a Word document onto pages.
pub fn lay_out(doc: WordDocument, config: &ConversionConfig) -> Rendered {
    let (width, height) = config.page_size.dimensions();
    let mut canvas = Canvas::new(width, height, config.margin);
    let body = config.font_size;
    let scale = body / 11.0;
    let mut embedded = 0;
    let mut skipped = 0;

    let WordDocument { blocks, media } = doc;
    for block in blocks {
        match block {
            Block::Paragraph { text, style } => {
                let text_style = match style {
                    ParagraphStyle::Title => TextStyle::new(Font::HelveticaBold, 20.0 * scale),
                    ParagraphStyle::Heading(level) => {
                        TextStyle::new(Font::HelveticaBold, heading_size(level) * scale)
                    }
                    ParagraphStyle::Normal | ParagraphStyle::ListItem => {
                        TextStyle::new(Font::Helvetica, body)
                    }
                };
                if text.trim().is_empty() {
                    canvas.text_line("", text_style);
                    continue;
                }
                let is_heading = matches!(style, ParagraphStyle::Title | ParagraphStyle::Heading(_));
                if is_heading {
                    // Keep a heading together with the line after it.
                    canvas.ensure_space(text_style.leading + body * 1.3);
                }
                let text = match style {
                    ParagraphStyle::ListItem => format!("• {}", text.trim_start()),
                    _ => text,
                };
                canvas.text_block(&text, text_style);
                canvas.advance(if is_heading { body * 0.5 } else { body * 0.4 });
            }
            Block::Image { rel_id } => {
                let Some(bytes) = media.get(&rel_id) else {
                    skipped += 1;
                    continue;
                };
                match PdfImage::from_bytes(bytes) {
                    Ok(image) => {
                        canvas.image(image, 0.6);
                        embedded += 1;
                    }
                    Err(e) => {
                        warn!("Skipping image {}: {}", rel_id, e);
                        skipped += 1;
                    }
                }
            }
            Block::Table { rows } => {
                canvas.table(&rows, TextStyle::new(Font::Helvetica, (body - 1.0).max(6.0)));
            }
            Block::PageBreak => canvas.break_page(),
        }
    }

    Rendered {
        layout: canvas.finish(),
        images_embedded: embedded,
        images_skipped: skipped,
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 18.0,
        2 => 16.0,
        3 => 14.0,
        4 => 13.0,
        _ => 12.0,
    }
}
