//! Pipeline stages for office-document-to-PDF conversion.
//!
//! Each format module reads its container into a small in-memory model and
//! lays that model out onto a [`crate::pdf::Canvas`]. The shared stages are
//! kept separate so each can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ package ──▶ docx / xlsx / ipynb / pptx ──▶ canvas ──▶ writer
//!           (zip+rels)   (parse → model → layout)       (pages)    (lopdf)
//!                                        │
//!                     pptx raster mode ──┴─▶ render (bitmap) ──▶ encode
//! ```
//!
//! 1. [`package`]: open the zip container and resolve relationships
//! 2. [`docx`], [`xlsx`], [`ipynb`], [`pptx`]: parse one format and lay it out
//! 3. [`text`]: markup cleanup for notebook cells
//! 4. [`render`]: rasterise slides; runs in `spawn_blocking`
//! 5. [`encode`]: turn image bytes or bitmaps into PDF image payloads

pub mod docx;
pub mod encode;
pub mod ipynb;
pub mod package;
pub mod pptx;
pub mod render;
pub mod text;
pub mod xlsx;

use crate::pdf::Layout;

/// A laid-out document plus the image counts that end up in the stats.
#[derive(Debug)]
pub struct Rendered {
    pub layout: Layout,
    pub images_embedded: usize,
    pub images_skipped: usize,
}
