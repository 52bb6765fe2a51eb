//! A paginated drawing surface.
//!
//! The canvas owns a vertical cursor that starts at the top margin and moves
//! down as text lines, images and table rows are placed. Before placing an
//! element it checks the element fits above the bottom margin and starts a
//! new page when it does not. Coordinates are PDF points with the origin at
//! the bottom-left corner.

use crate::pdf::fonts::{encode_win_ansi, Font};
use crate::pipeline::encode::PdfImage;
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const GREY: Rgb = Rgb(0.35, 0.35, 0.35);
    pub const BORDER: Rgb = Rgb(0.3, 0.3, 0.3);
}

/// How a run of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    /// Distance between baselines.
    pub leading: f32,
    pub color: Rgb,
    /// Extra left indent in points.
    pub indent: f32,
}

impl TextStyle {
    pub fn new(font: Font, size: f32) -> Self {
        Self {
            font,
            size,
            leading: size * 1.3,
            color: Rgb::BLACK,
            indent: 0.0,
        }
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn indent(mut self, pt: f32) -> Self {
        self.indent = pt;
        self
    }
}

/// One finished page: its size, content operations and the document-level
/// indices of the images it draws.
#[derive(Debug, Default)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub operations: Vec<Operation>,
    pub images: Vec<usize>,
}

/// Result of laying out a whole document.
#[derive(Debug)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub images: Vec<PdfImage>,
}

pub struct Canvas {
    width: f32,
    height: f32,
    margin: f32,
    pages: Vec<Page>,
    images: Vec<PdfImage>,
    /// Top of the next element.
    y: f32,
    dirty: bool,
}

impl Canvas {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
            pages: vec![Page {
                width,
                height,
                ..Default::default()
            }],
            images: Vec::new(),
            y: height - margin,
            dirty: false,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Vertical space left above the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.y - self.margin
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a fresh page unconditionally.
    pub fn new_page(&mut self) {
        self.pages.push(Page {
            width: self.width,
            height: self.height,
            ..Default::default()
        });
        self.y = self.height - self.margin;
        self.dirty = false;
    }

    /// Start a fresh page unless nothing has been drawn on the current one.
    pub fn break_page(&mut self) {
        if self.dirty {
            self.new_page();
        }
    }

    /// Break the page if `needed` points do not fit below the cursor.
    ///
    /// Returns true when a break happened. An element taller than a whole
    /// page is placed at the top of a fresh page and allowed to overflow.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if needed > self.remaining() && self.dirty {
            self.new_page();
            return true;
        }
        false
    }

    /// Move the cursor down, never past the bottom margin.
    pub fn advance(&mut self, dy: f32) {
        self.y = (self.y - dy).max(self.margin);
    }

    /// Draw word-wrapped text. `\n` forces a line break; an empty line still
    /// takes one line of vertical space.
    pub fn text_block(&mut self, text: &str, style: TextStyle) {
        let max_width = self.content_width() - style.indent;
        for line in wrap_text(text, style.font, style.size, max_width) {
            self.text_line(&line, style);
        }
    }

    /// Draw text with whitespace preserved, hard-wrapping long lines by
    /// character. Used for code.
    pub fn preformatted(&mut self, text: &str, style: TextStyle) {
        let max_width = self.content_width() - style.indent;
        for raw in text.split('\n') {
            let expanded = raw.trim_end_matches('\r').replace('\t', "    ");
            for line in split_by_width(&expanded, style.font, style.size, max_width) {
                self.text_line(&line, style);
            }
        }
    }

    /// Draw one line at the cursor and move down by the style's leading.
    pub fn text_line(&mut self, line: &str, style: TextStyle) {
        self.ensure_space(style.leading);
        let baseline = self.y - style.size;
        if !line.is_empty() {
            let x = self.margin + style.indent;
            let ops = text_operations(line, x, baseline, style);
            self.current().operations.extend(ops);
        }
        self.dirty = true;
        self.advance(style.leading);
    }

    /// Draw one line with its baseline at an absolute position. The cursor
    /// does not move.
    pub fn text_at(&mut self, line: &str, x: f32, baseline: f32, style: TextStyle) {
        if !line.is_empty() {
            let ops = text_operations(line, x, baseline, style);
            self.current().operations.extend(ops);
        }
        self.dirty = true;
    }

    /// Draw an image scaled to the content width and at most
    /// `max_height_fraction` of the content height, keeping its aspect ratio.
    pub fn image(&mut self, image: PdfImage, max_height_fraction: f32) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        // 96 px per inch is the convention for images without DPI metadata.
        let natural_w = image.width as f32 * 72.0 / 96.0;
        let natural_h = image.height as f32 * 72.0 / 96.0;
        let max_w = self.content_width();
        let max_h = self.content_height() * max_height_fraction.clamp(0.05, 1.0);
        let scale = (max_w / natural_w).min(max_h / natural_h).min(1.0);
        let (w, h) = (natural_w * scale, natural_h * scale);

        self.ensure_space(h);
        let x = self.margin;
        let y = self.y - h;
        self.place_image(image, x, y, w, h);
        self.dirty = true;
        self.advance(h + 6.0);
    }

    /// Draw an image covering the whole current page.
    pub fn full_page_image(&mut self, image: PdfImage) {
        let (w, h) = (self.width, self.height);
        self.place_image(image, 0.0, 0.0, w, h);
        self.dirty = true;
        self.y = self.margin;
    }

    /// Draw `rows` as a grid of bordered cells, one cell per value.
    ///
    /// Ragged rows are padded with empty cells. When the grid runs past the
    /// bottom margin the first row is repeated as a header on the next page.
    /// Returns the number of cells drawn.
    pub fn table(&mut self, rows: &[Vec<String>], style: TextStyle) -> usize {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return 0;
        }
        let padding = 3.0;
        let widths = column_widths(rows, columns, style, padding, self.content_width());
        let row_height = style.size + 2.0 * padding + 2.0;
        let mut cells = 0;

        self.current().operations.extend(stroke_setup());
        for (index, row) in rows.iter().enumerate() {
            if self.ensure_space(row_height) {
                self.current().operations.extend(stroke_setup());
                if index > 0 {
                    cells += self.table_row(&rows[0], &widths, row_height, padding, style);
                }
            }
            cells += self.table_row(row, &widths, row_height, padding, style);
        }
        self.advance(6.0);
        cells
    }

    fn table_row(
        &mut self,
        row: &[String],
        widths: &[f32],
        row_height: f32,
        padding: f32,
        style: TextStyle,
    ) -> usize {
        let top = self.y;
        let mut x = self.margin;
        let mut ops = Vec::new();
        for (col, width) in widths.iter().enumerate() {
            let y = top - row_height;
            ops.push(Operation::new(
                "re",
                vec![num(x), num(y), num(*width), num(row_height)],
            ));
            ops.push(Operation::new("S", vec![]));
            if let Some(value) = row.get(col).filter(|v| !v.is_empty()) {
                let text = fit_text(value, style.font, style.size, width - 2.0 * padding);
                ops.extend(text_operations(&text, x + padding, y + padding + 2.0, style));
            }
            x += width;
        }
        self.current().operations.extend(ops);
        self.dirty = true;
        self.advance(row_height);
        widths.len()
    }

    fn place_image(&mut self, image: PdfImage, x: f32, y: f32, w: f32, h: f32) {
        let index = self.images.len();
        self.images.push(image);
        let page = self.current();
        page.images.push(index);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![num(w), num(0.0), num(0.0), num(h), num(x), num(y)],
            ),
            Operation::new("Do", vec![Object::Name(image_name(index).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn current(&mut self) -> &mut Page {
        // `pages` is never empty: `new` seeds it and nothing removes pages.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn finish(self) -> Layout {
        Layout {
            pages: self.pages,
            images: self.images,
        }
    }
}

/// Resource name of the image at `index` in the document's image list.
pub fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn num(v: f32) -> Object {
    Object::from(v)
}

fn stroke_setup() -> [Operation; 2] {
    let Rgb(r, g, b) = Rgb::BORDER;
    [
        Operation::new("w", vec![num(0.5)]),
        Operation::new("RG", vec![num(r), num(g), num(b)]),
    ]
}

fn text_operations(text: &str, x: f32, baseline: f32, style: TextStyle) -> Vec<Operation> {
    let Rgb(r, g, b) = style.color;
    vec![
        Operation::new("rg", vec![num(r), num(g), num(b)]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![style.font.resource_name().into(), num(style.size)],
        ),
        Operation::new("Td", vec![num(x), num(baseline)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Greedy word wrap. Words wider than the line are split by character.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    wrap_with(text, max_width, |s| font.text_width(s, size))
}

/// [`wrap_text`] with a caller-supplied width function, for text that is
/// not drawn with the standard-14 fonts.
pub fn wrap_with(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = split_with(word, max_width, &measure);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }
    lines
}

/// Split `text` into chunks no wider than `max_width`, by character.
fn split_by_width(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    split_with(text, max_width, &|s: &str| font.text_width(s, size))
}

fn split_with(text: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;
    let mut utf8 = [0u8; 4];
    for c in text.chars() {
        let w = measure(c.encode_utf8(&mut utf8));
        if width + w > max_width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(c);
        width += w;
    }
    chunks.push(current);
    chunks
}

/// Truncate `text` with an ellipsis so it fits `max_width`.
pub fn fit_text(text: &str, font: Font, size: f32, max_width: f32) -> String {
    let single_line: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if font.text_width(&single_line, size) <= max_width {
        return single_line;
    }
    let mut out = String::new();
    for c in single_line.chars() {
        let mut probe = out.clone();
        probe.push(c);
        probe.push('…');
        if font.text_width(&probe, size) > max_width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

/// Width per column from the widest value, clamped, then scaled to fit.
fn column_widths(
    rows: &[Vec<String>],
    columns: usize,
    style: TextStyle,
    padding: f32,
    available: f32,
) -> Vec<f32> {
    let mut widths = vec![40.0_f32; columns];
    for row in rows {
        for (col, value) in row.iter().enumerate() {
            let w = style.font.text_width(value, style.size) + 2.0 * padding;
            widths[col] = widths[col].max(w.clamp(40.0, 180.0));
        }
    }
    let total: f32 = widths.iter().sum();
    if total > available {
        let factor = available / total;
        widths.iter_mut().for_each(|w| *w *= factor);
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle::new(Font::Helvetica, 10.0)
    }

    fn count_ops(layout: &Layout, operator: &str) -> usize {
        layout
            .pages
            .iter()
            .flat_map(|p| p.operations.iter())
            .filter(|op| op.operator == operator)
            .count()
    }

    #[test]
    fn wrap_respects_width() {
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod";
        let lines = wrap_text(text, Font::Helvetica, 10.0, 100.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Helvetica.text_width(line, 10.0) <= 100.0, "{line:?}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_keeps_blank_lines_and_splits_long_words() {
        let lines = wrap_text("a\n\nb", Font::Helvetica, 10.0, 100.0);
        assert_eq!(lines, vec!["a", "", "b"]);

        let long = "x".repeat(200);
        let lines = wrap_text(&long, Font::Courier, 10.0, 60.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn fit_text_truncates_with_ellipsis() {
        let fitted = fit_text("a very long cell value indeed", Font::Helvetica, 10.0, 50.0);
        assert!(fitted.ends_with('…'));
        assert!(Font::Helvetica.text_width(&fitted, 10.0) <= 50.0);
        assert_eq!(fit_text("ok", Font::Helvetica, 10.0, 50.0), "ok");
    }

    #[test]
    fn text_overflows_onto_new_page() {
        let mut canvas = Canvas::new(300.0, 200.0, 20.0);
        for i in 0..40 {
            canvas.text_line(&format!("line {i}"), style());
        }
        assert!(canvas.page_count() > 1);
        let layout = canvas.finish();
        assert_eq!(count_ops(&layout, "Tj"), 40);
    }

    #[test]
    fn break_page_skips_blank_page() {
        let mut canvas = Canvas::new(300.0, 200.0, 20.0);
        canvas.break_page();
        assert_eq!(canvas.page_count(), 1);
        canvas.text_line("x", style());
        canvas.break_page();
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn table_draws_one_rect_per_cell() {
        let rows = vec![
            vec!["h1".to_string(), "h2".to_string()],
            vec!["1".to_string(), String::new()],
            vec!["3".to_string()],
        ];
        let mut canvas = Canvas::new(595.0, 842.0, 50.0);
        let cells = canvas.table(&rows, style());
        assert_eq!(cells, 6);
        let layout = canvas.finish();
        assert_eq!(count_ops(&layout, "re"), 6);
        // Empty cells get a border but no text.
        assert_eq!(count_ops(&layout, "Tj"), 4);
    }

    #[test]
    fn table_repeats_header_after_page_break() {
        let mut rows = vec![vec!["Header".to_string()]];
        rows.extend((0..60).map(|i| vec![i.to_string()]));
        let mut canvas = Canvas::new(300.0, 300.0, 20.0);
        let cells = canvas.table(&rows, style());
        let pages = canvas.page_count();
        assert!(pages > 1);
        assert_eq!(cells, 61 + (pages - 1));

        let layout = canvas.finish();
        for page in &layout.pages[1..] {
            let first_text = page.operations.iter().find(|op| op.operator == "Tj");
            let bytes = match first_text.map(|op| &op.operands[0]) {
                Some(Object::String(b, _)) => b.clone(),
                other => panic!("unexpected operand {other:?}"),
            };
            assert_eq!(bytes, b"Header");
        }
    }

    #[test]
    fn image_is_scaled_into_content_box() {
        let mut canvas = Canvas::new(300.0, 400.0, 25.0);
        let image = PdfImage::from_dynamic(&image::DynamicImage::new_rgb8(2000, 100));
        canvas.image(image, 0.6);
        let layout = canvas.finish();
        assert_eq!(layout.images.len(), 1);
        assert_eq!(layout.pages[0].images, vec![0]);
        let cm = layout.pages[0]
            .operations
            .iter()
            .find(|op| op.operator == "cm")
            .expect("cm operation");
        match cm.operands[0] {
            Object::Real(w) => assert!((w - 250.0).abs() < 0.01, "width {w}"),
            ref other => panic!("unexpected operand {other:?}"),
        }
    }
}
