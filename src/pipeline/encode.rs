//! Image encoding: raw image bytes or a `DynamicImage` → PDF image payload.
//!
//! PDF can only show images in a few encodings natively. Baseline JPEG is
//! one of them (`/DCTDecode`), so RGB and greyscale JPEGs are passed through
//! byte for byte. Everything else is decoded and stored as raw 8-bit samples,
//! which the writer Flate-compresses. Storing lossless samples is what keeps
//! rasterised slide text crisp; a JPEG round trip would smear glyph edges.
//! Alpha is flattened onto white because PDF image XObjects have no alpha
//! channel without a separate soft mask.

use crate::error::ConvertError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Colour space of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Gray,
}

impl ColorSpace {
    pub fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Gray => "DeviceGray",
        }
    }
}

/// How `PdfImage::data` is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// JPEG bytes, written with `/Filter /DCTDecode`.
    Jpeg,
    /// Uncompressed 8-bit samples, row-major.
    Raw,
}

/// An image ready to become a PDF XObject.
#[derive(Clone)]
pub struct PdfImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for PdfImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_space", &self.color_space)
            .field("encoding", &self.encoding)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PdfImage {
    /// Decode an embedded picture (PNG, JPEG, GIF, BMP).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ConvertError::Image(e.to_string()))?;
        let format = reader.format();
        let decoded = reader.decode()?;

        if format == Some(ImageFormat::Jpeg) {
            let color_space = match decoded {
                DynamicImage::ImageRgb8(_) => Some(ColorSpace::Rgb),
                DynamicImage::ImageLuma8(_) => Some(ColorSpace::Gray),
                _ => None,
            };
            if let Some(color_space) = color_space {
                debug!(
                    "Passing JPEG through: {}x{} {:?}",
                    decoded.width(),
                    decoded.height(),
                    color_space
                );
                return Ok(Self {
                    width: decoded.width(),
                    height: decoded.height(),
                    color_space,
                    encoding: ImageEncoding::Jpeg,
                    data: bytes.to_vec(),
                });
            }
        }

        Ok(Self::from_dynamic(&decoded))
    }

    /// Store a decoded image as raw samples, flattening alpha onto white.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if let DynamicImage::ImageLuma8(gray) = img {
            return Self {
                width,
                height,
                color_space: ColorSpace::Gray,
                encoding: ImageEncoding::Raw,
                data: gray.as_raw().clone(),
            };
        }

        let rgba = img.to_rgba8();
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                data.push(blended as u8);
            }
        }
        debug!("Encoded image → {}x{} raw RGB", width, height);

        Self {
            width,
            height,
            color_space: ColorSpace::Rgb,
            encoding: ImageEncoding::Raw,
            data,
        }
    }
}
