//! Assemble a laid-out [`Layout`] into PDF bytes with lopdf.
//!
//! Object graph:
//!
//! ```text
//! Catalog → Pages ─┬─ Page 1 ─ Contents, Resources { Font, XObject }
//!                  ├─ Page 2 …
//! Info (Producer, Title)
//! ```
//!
//! Fonts are written once and shared by every page. Each page gets its own
//! `XObject` dictionary naming only the images it draws.

use crate::error::ConvertError;
use crate::pdf::canvas::{image_name, Layout};
use crate::pdf::fonts::{encode_win_ansi, Font};
use crate::pipeline::encode::{ImageEncoding, PdfImage};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Serialise `layout` to a complete PDF file.
///
/// When `compress` is set, content streams and raw image samples are
/// Flate-compressed. JPEG images are always stored as-is.
pub fn write_pdf(layout: Layout, compress: bool, title: Option<&str>) -> Result<Vec<u8>, ConvertError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let id = doc.add_object(font.dictionary());
        fonts.set(font.resource_name(), id);
    }
    let fonts_id = doc.add_object(fonts);

    let image_ids: Vec<ObjectId> = layout
        .images
        .iter()
        .map(|image| doc.add_object(image_stream(image)))
        .collect();

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in layout.pages {
        let content = Content {
            operations: page.operations,
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut xobjects = Dictionary::new();
        for index in &page.images {
            if let Some(id) = image_ids.get(*index) {
                xobjects.set(image_name(*index), *id);
            }
        }
        let resources = dictionary! {
            "Font" => fonts_id,
            "XObject" => xobjects,
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width),
                Object::Real(page.height),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Producer" => Object::string_literal(format!("office2pdf {}", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        info.set("Title", Object::String(encode_win_ansi(title), StringFormat::Literal));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    if compress {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ConvertError::Pdf(e.to_string()))?;
    debug!("Wrote PDF: {} pages, {} bytes", count, bytes.len());
    Ok(bytes)
}

fn image_stream(image: &PdfImage) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => image.color_space.pdf_name(),
        "BitsPerComponent" => 8_i64,
    };
    match image.encoding {
        ImageEncoding::Jpeg => {
            dict.set("Filter", "DCTDecode");
            let mut stream = Stream::new(dict, image.data.clone());
            stream.allows_compression = false;
            stream
        }
        ImageEncoding::Raw => Stream::new(dict, image.data.clone()),
    }
}
