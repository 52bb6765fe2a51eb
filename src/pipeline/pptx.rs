//! PowerPoint presentations: slide size and per-slide text.
//!
//! Only text survives. Pictures, shapes, themes and positions are dropped,
//! and every slide becomes one page of the slide's own size with its
//! paragraphs stacked top to bottom, the first one larger as a title.

use crate::error::ConvertError;
use crate::pdf::canvas::wrap_with;
use crate::pdf::{Canvas, Font, Rgb, TextStyle};
use crate::pipeline::package::{Package, Relationship};
use crate::pipeline::Rendered;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::debug;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const EMU_PER_POINT: f32 = 12_700.0;
/// 10 × 7.5 in.
const DEFAULT_SLIDE_EMU: (i64, i64) = (9_144_000, 6_858_000);
/// Slide edge limits allowed by `p:sldSz` (1 in to 56 in).
const SLIDE_EMU_RANGE: (i64, i64) = (914_400, 51_206_400);

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// 1-based position in the presentation.
    pub number: usize,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub width_pt: f32,
    pub height_pt: f32,
    pub slides: Vec<Slide>,
}

/// Open a `.pptx` package and extract every slide's text.
pub fn read(bytes: &[u8], name: &str) -> Result<Presentation, ConvertError> {
    let mut package = Package::open(bytes, name, "PowerPoint")?;
    let xml = package.read_string(PRESENTATION_PART)?;
    let info = parse_presentation_xml(&xml)?;
    let rels = package.relationships(PRESENTATION_PART)?;

    let parts = slide_parts(&info.slide_ids, &rels);
    let mut slides = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        let xml = package.read_string(part)?;
        let paragraphs = parse_slide_xml(&xml, part)?;
        debug!("{}: {} paragraphs", part, paragraphs.len());
        slides.push(Slide {
            number: index + 1,
            paragraphs,
        });
    }

    let (cx, cy) = info.size_emu;
    Ok(Presentation {
        width_pt: cx as f32 / EMU_PER_POINT,
        height_pt: cy as f32 / EMU_PER_POINT,
        slides,
    })
}

#[derive(Debug, PartialEq)]
pub struct PresentationInfo {
    pub size_emu: (i64, i64),
    /// Relationship ids from `p:sldIdLst`, in presentation order.
    pub slide_ids: Vec<String>,
}

pub fn parse_presentation_xml(xml: &str) -> Result<PresentationInfo, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut info = PresentationInfo {
        size_emu: DEFAULT_SLIDE_EMU,
        slide_ids: Vec::new(),
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) => match e.name().as_ref() {
                b"p:sldSz" => {
                    for attr in e.attributes().flatten() {
                        let Ok(value) = attr.decode_and_unescape_value(&reader) else {
                            continue;
                        };
                        let parsed = value
                            .parse::<i64>()
                            .ok()
                            .filter(|v| *v > 0)
                            .map(|v| v.clamp(SLIDE_EMU_RANGE.0, SLIDE_EMU_RANGE.1));
                        match (attr.key.as_ref(), parsed) {
                            (b"cx", Some(v)) => info.size_emu.0 = v,
                            (b"cy", Some(v)) => info.size_emu.1 = v,
                            _ => {}
                        }
                    }
                }
                b"p:sldId" => {
                    let id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"r:id")
                        .and_then(|a| a.decode_and_unescape_value(&reader).ok());
                    if let Some(id) = id {
                        info.slide_ids.push(id.into_owned());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::Xml {
                    part: PRESENTATION_PART.to_string(),
                    detail: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(info)
}

/// Slide part paths in presentation order.
///
/// `p:sldIdLst` decides the order. Without it, every slide relationship is
/// used, sorted by the number in its file name.
pub fn slide_parts(slide_ids: &[String], rels: &HashMap<String, Relationship>) -> Vec<String> {
    let is_slide = |rel: &&Relationship| rel.kind.ends_with("/slide") && !rel.external;
    if !slide_ids.is_empty() {
        return slide_ids
            .iter()
            .filter_map(|id| rels.get(id))
            .filter(|rel| is_slide(rel))
            .map(|rel| rel.target.clone())
            .collect();
    }
    let mut parts: Vec<String> = rels
        .values()
        .filter(is_slide)
        .map(|rel| rel.target.clone())
        .collect();
    parts.sort_by_key(|part| (slide_number(part), part.clone()));
    parts
}

fn slide_number(part: &str) -> u32 {
    let file = part.rsplit('/').next().unwrap_or(part);
    let digits: String = file.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(u32::MAX)
}

/// Text of every non-empty `a:p` paragraph, in document order.
pub fn parse_slide_xml(xml: &str, part: &str) -> Result<Vec<String>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let xml_error = |e: quick_xml::Error| ConvertError::Xml {
        part: part.to_string(),
        detail: e.to_string(),
    };

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"mc:Fallback" => {
                    let name = e.name().as_ref().to_vec();
                    reader
                        .read_to_end_into(QName(&name), &mut skip_buf)
                        .map_err(xml_error)?;
                    skip_buf.clear();
                }
                b"a:p" => current = Some(String::new()),
                b"a:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if let (b"a:br", Some(text)) = (e.name().as_ref(), current.as_mut()) {
                    text.push('\n');
                }
            }
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(xml_error)?;
                if let Some(current) = current.as_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if let Some(text) = current.take() {
                        let text = text.trim();
                        if !text.is_empty() {
                            paragraphs.push(text.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

// ── Slide layout ─────────────────────────────────────────────────────────────

/// One line of slide text, positioned in points from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    /// Top of the line box.
    pub top: f32,
    pub size: f32,
    pub title: bool,
}

/// Wrap and size a slide's paragraphs so that they fit on the slide.
///
/// Text starts large (title at 1/14 of the slide height, body at 1/24) and
/// shrinks until it fits, down to 8 pt. Lines that still do not fit are cut
/// and the last kept line ends with `…`.
///
/// `measure(text, size, title)` returns the width of `text` in points.
pub fn plan_slide(
    slide: &Slide,
    width: f32,
    height: f32,
    measure: impl Fn(&str, f32, bool) -> f32,
) -> Vec<PlacedLine> {
    if slide.paragraphs.is_empty() {
        return Vec::new();
    }
    let margin_x = width * 0.06;
    let margin_y = height * 0.08;
    let max_width = width - 2.0 * margin_x;
    let max_height = height - 2.0 * margin_y;

    let mut scale = 1.0_f32;
    loop {
        let title_size = (height / 14.0 * scale).max(8.0);
        let body_size = (height / 24.0 * scale).max(8.0);
        let mut lines = Vec::new();
        let mut y = margin_y;
        for (index, paragraph) in slide.paragraphs.iter().enumerate() {
            let title = index == 0;
            let size = if title { title_size } else { body_size };
            for text in wrap_with(paragraph, max_width, |s| measure(s, size, title)) {
                lines.push(PlacedLine {
                    text,
                    x: margin_x,
                    top: y,
                    size,
                    title,
                });
                y += size * 1.25;
            }
            y += if title { size * 0.6 } else { size * 0.35 };
        }

        let fits = lines
            .last()
            .is_none_or(|l| l.top + l.size * 1.25 <= margin_y + max_height);
        if fits {
            return lines;
        }
        if body_size <= 8.0 {
            let limit = margin_y + max_height;
            let mut kept: Vec<PlacedLine> = lines
                .into_iter()
                .take_while(|l| l.top + l.size * 1.25 <= limit)
                .collect();
            if let Some(last) = kept.last_mut() {
                last.text.push('…');
            }
            return kept;
        }
        scale *= 0.85;
    }
}

/// Draw slides as selectable text, one slide-sized page each.
pub fn lay_out_vector(presentation: &Presentation) -> Rendered {
    let (width, height) = (presentation.width_pt, presentation.height_pt);
    // Lines are positioned absolutely; the canvas margin is unused.
    let mut canvas = Canvas::new(width, height, 0.0);
    let ink = Rgb(0.12, 0.12, 0.12);

    for (index, slide) in presentation.slides.iter().enumerate() {
        if index > 0 {
            canvas.new_page();
        }
        let lines = plan_slide(slide, width, height, |text, size, title| {
            slide_font(title).text_width(text, size)
        });
        for line in lines {
            let style = TextStyle::new(slide_font(line.title), line.size).color(ink);
            canvas.text_at(&line.text, line.x, height - line.top - line.size, style);
        }
    }
    debug!("Vector slides: {} pages", canvas.page_count());

    Rendered {
        layout: canvas.finish(),
        images_embedded: 0,
        images_skipped: 0,
    }
}

fn slide_font(title: bool) -> Font {
    if title {
        Font::HelveticaBold
    } else {
        Font::Helvetica
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst>
  <p:sldSz cx="12192000" cy="6858000"/>
</p:presentation>"#;

    #[test]
    fn presentation_size_and_order() {
        let info = parse_presentation_xml(PRESENTATION).unwrap();
        assert_eq!(info.size_emu, (12_192_000, 6_858_000));
        assert_eq!(info.slide_ids, vec!["rId3", "rId2"]);
    }

    #[test]
    fn missing_size_uses_default() {
        let info = parse_presentation_xml("<p:presentation/>").unwrap();
        assert_eq!(info.size_emu, DEFAULT_SLIDE_EMU);
    }

    #[test]
    fn slide_size_is_clamped() {
        let huge = parse_presentation_xml(r#"<p:presentation><p:sldSz cx="10000000000" cy="10000000000"/></p:presentation>"#)
            .unwrap();
        assert_eq!(huge.size_emu, (SLIDE_EMU_RANGE.1, SLIDE_EMU_RANGE.1));

        let tiny = parse_presentation_xml(r#"<p:presentation><p:sldSz cx="10" cy="6858000"/></p:presentation>"#).unwrap();
        assert_eq!(tiny.size_emu, (SLIDE_EMU_RANGE.0, 6_858_000));
    }

    fn rel(kind: &str, target: &str) -> Relationship {
        Relationship {
            kind: format!("http://schemas.openxmlformats.org/officeDocument/2006/relationships/{kind}"),
            target: target.into(),
            external: false,
        }
    }

    #[test]
    fn slide_order_follows_id_list_then_file_number() {
        let mut rels = HashMap::new();
        rels.insert("rId1".to_string(), rel("slideMaster", "ppt/slideMasters/slideMaster1.xml"));
        rels.insert("rId2".to_string(), rel("slide", "ppt/slides/slide1.xml"));
        rels.insert("rId3".to_string(), rel("slide", "ppt/slides/slide2.xml"));
        rels.insert("rId4".to_string(), rel("slide", "ppt/slides/slide10.xml"));

        let ids = vec!["rId3".to_string(), "rId2".to_string()];
        assert_eq!(
            slide_parts(&ids, &rels),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]
        );
        assert_eq!(
            slide_parts(&[], &rels),
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide10.xml"
            ]
        );
    }

    #[test]
    fn slide_paragraphs_in_order() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
<p:sp><p:txBody><a:p><a:r><a:t>Quarterly </a:t></a:r><a:r><a:t>Review</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:p><a:r><a:t>Revenue up</a:t></a:r><a:br/><a:r><a:t>Costs down</a:t></a:r></a:p><a:p/><a:p><a:endParaRPr/></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#;
        let paragraphs = parse_slide_xml(xml, "ppt/slides/slide1.xml").unwrap();
        assert_eq!(paragraphs, vec!["Quarterly Review", "Revenue up\nCosts down"]);
    }

    fn plain_measure(text: &str, size: f32, title: bool) -> f32 {
        slide_font(title).text_width(text, size)
    }

    #[test]
    fn plan_keeps_text_inside_slide() {
        let slide = Slide {
            number: 1,
            paragraphs: std::iter::once("Title".to_string())
                .chain((0..40).map(|i| format!("Bullet point number {i} with some words")))
                .collect(),
        };
        let lines = plan_slide(&slide, 720.0, 540.0, plain_measure);
        assert!(!lines.is_empty());
        assert!(lines[0].title);
        let bottom = lines.last().map(|l| l.top + l.size * 1.25).unwrap();
        assert!(bottom <= 540.0 * 0.92 + 0.01, "bottom {bottom}");
        for line in &lines {
            assert!(plain_measure(&line.text, line.size, line.title) <= 720.0 * 0.88 + 12.0);
        }
    }

    #[test]
    fn vector_mode_one_page_per_slide() {
        let presentation = Presentation {
            width_pt: 720.0,
            height_pt: 540.0,
            slides: vec![
                Slide {
                    number: 1,
                    paragraphs: vec!["Hello".into(), "World".into()],
                },
                Slide {
                    number: 2,
                    paragraphs: vec![],
                },
                Slide {
                    number: 3,
                    paragraphs: vec!["Bye".into()],
                },
            ],
        };
        let rendered = lay_out_vector(&presentation);
        assert_eq!(rendered.layout.pages.len(), 3);
        assert!(rendered
            .layout
            .pages
            .iter()
            .all(|p| p.width == 720.0 && p.height == 540.0));
    }
}
