//! Slide rasterisation: slide text → RGB bitmap via imageproc + ab_glyph.
//!
//! ## Why spawn_blocking?
//!
//! Glyph rasterisation is pure CPU work. A 960 × 720 slide with a few dozen
//! lines takes milliseconds, which is long enough to stall a Tokio worker
//! thread serving other requests. Each slide is therefore drawn inside
//! `tokio::task::spawn_blocking`, and up to `concurrency` slides are in
//! flight at once through `buffer_unordered`.
//!
//! ## Fonts
//!
//! PDF readers ship the standard-14 fonts, but a bitmap needs real glyph
//! outlines. The font comes from [`ConversionConfig::slide_font`] or from a
//! list of well-known system locations. When none loads, the caller falls
//! back to vector slides.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::encode::PdfImage;
use crate::pipeline::pptx::{plan_slide, Slide};
use ab_glyph::{FontVec, PxScale};
use futures::stream::{self, StreamExt};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fonts tried, in order, when no slide font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const INK: Rgb<u8> = Rgb([30, 30, 30]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

/// Largest slide bitmap drawn, in pixels. Bigger slides are drawn at a
/// lower resolution.
const MAX_SLIDE_PIXELS: f32 = 40_000_000.0;

/// Load the slide font named in `config`, or the first system font found.
///
/// Returns `None` (after logging why) when nothing usable exists.
pub fn load_slide_font(config: &ConversionConfig) -> Option<Arc<FontVec>> {
    let candidates: Vec<PathBuf> = match &config.slide_font {
        Some(path) => vec![path.clone()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };
    for path in &candidates {
        match load_font_file(path) {
            Ok(font) => {
                info!("Slide font: {}", path.display());
                return Some(Arc::new(font));
            }
            Err(e) if config.slide_font.is_some() => {
                warn!("Cannot use slide font {}: {}", path.display(), e);
            }
            Err(e) => debug!("Font candidate {} unusable: {}", path.display(), e),
        }
    }
    warn!("No TrueType font available for raster slides");
    None
}

fn load_font_file(path: &Path) -> Result<FontVec, ConvertError> {
    let data = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    FontVec::try_from_vec(data).map_err(|e| ConvertError::Image(format!("invalid font: {e}")))
}

/// Rasterise every slide and return one image per slide, in slide order.
pub async fn rasterise_slides(
    slides: Vec<Slide>,
    width_pt: f32,
    height_pt: f32,
    font: Arc<FontVec>,
    config: &ConversionConfig,
) -> Result<Vec<PdfImage>, ConvertError> {
    let dpi = config.slide_dpi;
    let total = slides.len();

    let mut results: Vec<(usize, Result<PdfImage, ConvertError>)> = stream::iter(slides)
        .map(|slide| {
            let font = Arc::clone(&font);
            async move {
                let number = slide.number;
                let result = tokio::task::spawn_blocking(move || {
                    let img = draw_slide(&slide, width_pt, height_pt, dpi, &font);
                    PdfImage::from_dynamic(&DynamicImage::ImageRgb8(img))
                })
                .await
                .map_err(|e| ConvertError::Internal(format!("Slide {number} task panicked: {e}")));
                (number, result)
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(number, _)| *number);
    let images = results
        .into_iter()
        .map(|(_, result)| result)
        .collect::<Result<Vec<_>, _>>()?;
    info!("Rasterised {} slides at {} DPI", total, dpi);
    Ok(images)
}

/// Draw one slide onto a white bitmap.
pub fn draw_slide(slide: &Slide, width_pt: f32, height_pt: f32, dpi: u32, font: &FontVec) -> RgbImage {
    let px_per_pt = pixels_per_point(width_pt, height_pt, dpi);
    let width_px = ((width_pt * px_per_pt).round() as u32).max(1);
    let height_px = ((height_pt * px_per_pt).round() as u32).max(1);
    let mut img = RgbImage::from_pixel(width_px, height_px, PAPER);

    let measure = |text: &str, size: f32, _title: bool| {
        let (w, _) = text_size(PxScale::from(size * px_per_pt), font, text);
        w as f32 / px_per_pt
    };
    let lines = plan_slide(slide, width_pt, height_pt, measure);
    for line in &lines {
        draw_text_mut(
            &mut img,
            INK,
            (line.x * px_per_pt).round() as i32,
            (line.top * px_per_pt).round() as i32,
            PxScale::from(line.size * px_per_pt),
            font,
            &line.text,
        );
    }
    debug!(
        "Slide {} → {}x{} px, {} lines",
        slide.number,
        width_px,
        height_px,
        lines.len()
    );
    img
}

/// Pixels per point for a slide at `dpi`, lowered so the bitmap stays
/// within [`MAX_SLIDE_PIXELS`].
fn pixels_per_point(width_pt: f32, height_pt: f32, dpi: u32) -> f32 {
    let requested = dpi as f32 / 72.0;
    let area = width_pt.max(1.0) * height_pt.max(1.0) * requested * requested;
    if area <= MAX_SLIDE_PIXELS {
        return requested;
    }
    let scaled = requested * (MAX_SLIDE_PIXELS / area).sqrt();
    debug!(
        "Slide {}x{} pt too large at {} DPI; drawing at {:.0} DPI",
        width_pt,
        height_pt,
        dpi,
        scaled * 72.0
    );
    scaled
}
