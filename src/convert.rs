//! Conversion entry points: office document bytes or path → PDF bytes.
//!
//! [`Converter`] holds the immutable settings shared by every conversion,
//! including the slide font, which is loaded once. The free functions
//! [`convert_path`], [`convert_bytes`] and [`convert_to_file`] build a
//! throwaway `Converter` for one-shot use.
//!
//! Parsing, layout and PDF writing are CPU-bound and run inside
//! `tokio::task::spawn_blocking`. Raster slides fan out further in
//! [`render::rasterise_slides`].

use crate::config::{ConversionConfig, SlideRendering};
use crate::error::ConvertError;
use crate::format::DocumentKind;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pdf::{write_pdf, Canvas};
use crate::pipeline::pptx::Presentation;
use crate::pipeline::{docx, ipynb, pptx, render, xlsx, Rendered};
use ab_glyph::FontVec;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reusable converter. Cheap to share behind an `Arc`.
///
/// # Example
/// ```rust,no_run
/// use office2pdf::{ConversionConfig, Converter, DocumentKind};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::new(ConversionConfig::default());
/// let bytes = std::fs::read("report.docx")?;
/// let output = converter
///     .convert_bytes(DocumentKind::Word, bytes, "report.docx")
///     .await?;
/// std::fs::write("report.pdf", &output.pdf)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    slide_font: Option<Arc<FontVec>>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("slide_font", &self.slide_font.is_some())
            .finish()
    }
}

/// What the blocking parse step hands back.
enum Parsed {
    Laid(Rendered),
    /// Slides waiting to be rasterised.
    Slides(Presentation),
}

impl Converter {
    /// Create a converter. Loads the slide font when slides are rasterised.
    pub fn new(config: ConversionConfig) -> Self {
        let slide_font = match config.slide_rendering {
            SlideRendering::Raster => render::load_slide_font(&config),
            SlideRendering::Vector => None,
        };
        Self { config, slide_font }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// True when PowerPoint input will be rasterised rather than drawn as text.
    pub fn rasterises_slides(&self) -> bool {
        self.config.slide_rendering == SlideRendering::Raster && self.slide_font.is_some()
    }

    /// Convert a file on disk. The kind is inferred from the extension
    /// unless given.
    pub async fn convert_path(
        &self,
        path: impl AsRef<Path>,
        kind: Option<DocumentKind>,
    ) -> Result<ConversionOutput, ConvertError> {
        let path = path.as_ref();
        let kind = match kind {
            Some(kind) => kind,
            None => DocumentKind::from_path(path).ok_or_else(|| unknown_kind(path))?,
        };
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ConvertError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.convert_bytes(kind, bytes, &name).await
    }

    /// Convert an in-memory document. `file_name` must carry an extension
    /// accepted for `kind`; its stem becomes the PDF title.
    pub async fn convert_bytes(
        &self,
        kind: DocumentKind,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<ConversionOutput, ConvertError> {
        let total_start = Instant::now();
        info!("Starting {} conversion: {} ({} bytes)", kind, file_name, bytes.len());

        // ── Step 1: Validate extension ───────────────────────────────────
        kind.check_extension(file_name)?;
        let input_bytes = bytes.len();

        // ── Step 2: Parse and lay out ────────────────────────────────────
        let parse_start = Instant::now();
        let config = self.config.clone();
        let rasterise = self.rasterises_slides();
        if kind == DocumentKind::PowerPoint
            && config.slide_rendering == SlideRendering::Raster
            && !rasterise
        {
            warn!("No slide font available; drawing slides as vector text");
        }
        let name = file_name.to_string();
        let parsed = blocking(move || parse_and_lay_out(kind, &bytes, &name, &config, rasterise)).await?;
        debug!("Parsed {} in {}ms", file_name, parse_start.elapsed().as_millis());

        // ── Step 3: Rasterise slides (PowerPoint raster mode) ────────────
        let rendered = match parsed {
            Parsed::Laid(rendered) => rendered,
            Parsed::Slides(presentation) => self.rasterise(presentation).await?,
        };
        let page_count = rendered.layout.pages.len();

        // ── Step 4: Write PDF ────────────────────────────────────────────
        let write_start = Instant::now();
        let compress = self.config.compress;
        let title = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        let layout = rendered.layout;
        let pdf = blocking(move || write_pdf(layout, compress, title.as_deref())).await?;
        debug!(
            "Wrote {} pages ({} bytes) in {}ms",
            page_count,
            pdf.len(),
            write_start.elapsed().as_millis()
        );

        // ── Step 5: Compute stats ────────────────────────────────────────
        let stats = ConversionStats {
            kind,
            page_count,
            input_bytes,
            output_bytes: pdf.len(),
            images_embedded: rendered.images_embedded,
            images_skipped: rendered.images_skipped,
            duration_ms: total_start.elapsed().as_millis() as u64,
        };
        if stats.images_skipped > 0 {
            warn!("{} image(s) could not be embedded", stats.images_skipped);
        }
        info!(
            "Conversion complete: {} → {} pages, {}ms total",
            file_name, stats.page_count, stats.duration_ms
        );

        Ok(ConversionOutput { pdf, stats })
    }

    async fn rasterise(&self, presentation: Presentation) -> Result<Rendered, ConvertError> {
        let Some(font) = self.slide_font.clone() else {
            return Ok(pptx::lay_out_vector(&presentation));
        };
        let (width, height) = (presentation.width_pt, presentation.height_pt);
        let images =
            render::rasterise_slides(presentation.slides, width, height, font, &self.config)
                .await?;

        let mut canvas = Canvas::new(width, height, 0.0);
        let embedded = images.len();
        for (index, image) in images.into_iter().enumerate() {
            if index > 0 {
                canvas.new_page();
            }
            canvas.full_page_image(image);
        }
        Ok(Rendered {
            layout: canvas.finish(),
            images_embedded: embedded,
            images_skipped: 0,
        })
    }
}

fn parse_and_lay_out(
    kind: DocumentKind,
    bytes: &[u8],
    name: &str,
    config: &ConversionConfig,
    rasterise: bool,
) -> Result<Parsed, ConvertError> {
    let rendered = match kind {
        DocumentKind::Word => docx::lay_out(docx::read(bytes, name)?, config),
        DocumentKind::Excel => xlsx::lay_out(&xlsx::read(bytes, name)?, config),
        DocumentKind::Notebook => ipynb::lay_out(&ipynb::parse(bytes)?, config),
        DocumentKind::PowerPoint => {
            let presentation = pptx::read(bytes, name)?;
            info!(
                "Presentation has {} slides ({:.0} × {:.0} pt)",
                presentation.slides.len(),
                presentation.width_pt,
                presentation.height_pt
            );
            if rasterise {
                return Ok(Parsed::Slides(presentation));
            }
            pptx::lay_out_vector(&presentation)
        }
    };
    Ok(Parsed::Laid(rendered))
}

/// Run CPU-bound work off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConvertError::Internal(format!("Blocking task failed: {e}")))?
}

fn unknown_kind(path: &Path) -> ConvertError {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let expected = DocumentKind::ALL
        .iter()
        .flat_map(|k| k.extensions())
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(", ");
    ConvertError::UnsupportedExtension {
        extension,
        kind: "document",
        expected,
    }
}

// ── One-shot helpers ─────────────────────────────────────────────────────

/// Convert a file on disk, inferring its kind from the extension.
pub async fn convert_path(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    Converter::new(config.clone()).convert_path(path, None).await
}

/// Convert in-memory document bytes.
pub async fn convert_bytes(
    kind: DocumentKind,
    bytes: Vec<u8>,
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    Converter::new(config.clone())
        .convert_bytes(kind, bytes, file_name)
        .await
}

/// Convert a document and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    converter: &Converter,
    input_path: impl AsRef<Path>,
    kind: Option<DocumentKind>,
    output_path: impl AsRef<Path>,
) -> Result<ConversionStats, ConvertError> {
    let output = converter.convert_path(input_path, kind).await?;
    write_atomic(output_path.as_ref(), &output.pdf).await?;
    Ok(output.stats)
}

/// Write `bytes` next to `path` and rename into place.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::io(parent, e))?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| ConvertError::io(&tmp_path, e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ConvertError::io(path, e))
}

/// Synchronous wrapper around [`convert_path`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert_path(path, config))
}
