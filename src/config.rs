//! Configuration types for document-to-PDF conversion and the HTTP server.
//!
//! Layout and rendering knobs live in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Process-level settings for the HTTP service
//! (bind address, scratch directory, upload limit, cleanup retries) live in
//! [`ServerConfig`]. The CLI maps its flags onto both.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a single conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use office2pdf::{ConversionConfig, PageSize, SlideRendering};
///
/// let config = ConversionConfig::builder()
///     .page_size(PageSize::Letter)
///     .margin(36.0)
///     .slide_rendering(SlideRendering::Vector)
///     .build()
///     .unwrap();
/// assert_eq!(config.margin, 36.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Paper size for Word, Excel and notebook output. Default: A4.
    pub page_size: PageSize,

    /// Page margin in points on every side. Range: 18–144. Default: 50.
    pub margin: f32,

    /// Body text size in points. Range: 6–24. Default: 11.
    ///
    /// Headings, code and table cells are sized relative to this.
    pub font_size: f32,

    /// How PowerPoint slides become PDF pages. Default: [`SlideRendering::Raster`].
    pub slide_rendering: SlideRendering,

    /// Rasterisation density for slides. Range: 48–300. Default: 96.
    ///
    /// A 10 × 7.5 in slide at 96 DPI is 960 × 720 px, which keeps the
    /// embedded bitmap well under a megabyte after Flate compression.
    pub slide_dpi: u32,

    /// TrueType/OpenType font used to draw raster slides.
    ///
    /// If None, a handful of well-known system locations are probed. When no
    /// font can be loaded the converter falls back to vector slides.
    pub slide_font: Option<PathBuf>,

    /// Maximum number of slides rasterised at once. Default: 4.
    pub concurrency: usize,

    /// Flate-compress content streams in the output. Default: true.
    pub compress: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin: 50.0,
            font_size: 11.0,
            slide_rendering: SlideRendering::default(),
            slide_dpi: 96,
            slide_font: None,
            concurrency: 4,
            compress: true,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin(mut self, pt: f32) -> Self {
        self.config.margin = pt.clamp(18.0, 144.0);
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.font_size = pt.clamp(6.0, 24.0);
        self
    }

    pub fn slide_rendering(mut self, mode: SlideRendering) -> Self {
        self.config.slide_rendering = mode;
        self
    }

    pub fn slide_dpi(mut self, dpi: u32) -> Self {
        self.config.slide_dpi = dpi.clamp(48, 300);
        self
    }

    pub fn slide_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.slide_font = Some(path.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn compress(mut self, v: bool) -> Self {
        self.config.compress = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        let (w, h) = c.page_size.dimensions();
        if c.margin * 2.0 >= w.min(h) - 72.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "margin {}pt leaves no room for content on {:?}",
                c.margin, c.page_size
            )));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:5000`.
    pub bind: SocketAddr,

    /// Parent directory of the per-request scratch directories.
    /// Default: the OS temp directory.
    pub temp_root: PathBuf,

    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// How many times a temp file deletion is attempted. Default: 5.
    pub cleanup_attempts: u32,

    /// Pause between deletion attempts in milliseconds. Default: 200.
    pub cleanup_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            temp_root: std::env::temp_dir(),
            max_upload_bytes: 50 * 1024 * 1024,
            cleanup_attempts: 5,
            cleanup_delay_ms: 200,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size of generated pages (slides use the presentation's own size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PageSize {
    /// Width and height in PDF points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// How slides are turned into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideRendering {
    /// Draw each slide's text into a bitmap and embed one image per page. (default)
    #[default]
    Raster,
    /// Draw each slide's text as selectable PDF text on a slide-sized page.
    Vector,
}
