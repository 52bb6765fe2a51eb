//! Fixture documents built in code.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Zip the given `(part name, content)` pairs.
pub fn zip_parts(parts: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A small solid-colour PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn rels(entries: &[(&str, &str, &str)]) -> Vec<u8> {
    let mut xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{REL_NS}">"#);
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{OFFICE_REL}/{kind}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

/// A Word document with a heading, a body paragraph and one embedded PNG.
pub fn docx() -> Vec<u8> {
    let document = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly report</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Revenue grew </w:t></w:r><w:r><w:t>in every region.</w:t></w:r></w:p>
    <w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData>
      <pic:pic><pic:blipFill><a:blip r:embed="rId5"/></pic:blipFill></pic:pic>
    </a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>
    <w:sectPr/>
  </w:body>
</w:document>"#;
    zip_parts(&[
        ("[Content_Types].xml", content_types("wordprocessingml.document.main", "/word/document.xml")),
        ("_rels/.rels", rels(&[("rId1", "officeDocument", "word/document.xml")])),
        ("word/document.xml", document.as_bytes().to_vec()),
        ("word/_rels/document.xml.rels", rels(&[("rId5", "image", "media/image1.png")])),
        ("word/media/image1.png", png(40, 20)),
    ])
}

fn content_types(main: &str, part: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="{part}" ContentType="application/vnd.openxmlformats-officedocument.{main}+xml"/>
</Types>"#
    )
    .into_bytes()
}

/// A one-sheet workbook. Every value is stored as a shared string; an empty
/// string leaves the cell out entirely.
pub fn xlsx(sheet_name: &str, rows: &[Vec<&str>]) -> Vec<u8> {
    let mut strings: Vec<&str> = Vec::new();
    let mut sheet_data = String::new();
    for (r, row) in rows.iter().enumerate() {
        sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let index = strings.len();
            strings.push(*value);
            sheet_data.push_str(&format!(
                r#"<c r="{}{}" t="s"><v>{index}</v></c>"#,
                column_letter(c),
                r + 1
            ));
        }
        sheet_data.push_str("</row>");
    }

    let shared = strings
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect::<String>();
    let shared_strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{shared}</sst>"#,
        n = strings.len()
    );
    let worksheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="{sheet_name}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#;

    zip_parts(&[
        ("[Content_Types].xml", content_types.as_bytes().to_vec()),
        ("_rels/.rels", rels(&[("rId1", "officeDocument", "xl/workbook.xml")])),
        ("xl/workbook.xml", workbook.into_bytes()),
        (
            "xl/_rels/workbook.xml.rels",
            rels(&[
                ("rId1", "worksheet", "worksheets/sheet1.xml"),
                ("rId2", "sharedStrings", "sharedStrings.xml"),
            ]),
        ),
        ("xl/worksheets/sheet1.xml", worksheet.into_bytes()),
        ("xl/sharedStrings.xml", shared_strings.into_bytes()),
    ])
}

fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// A presentation with one slide per entry; each entry lists its paragraphs.
pub fn pptx(slides: &[&[&str]]) -> Vec<u8> {
    pptx_sized(slides, 9_144_000, 6_858_000)
}

/// Like [`pptx`], with the slide size given in EMU.
pub fn pptx_sized(slides: &[&[&str]], cx: u64, cy: u64) -> Vec<u8> {
    let mut ids = String::new();
    let mut presentation_rels = Vec::new();
    let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
    for (i, paragraphs) in slides.iter().enumerate() {
        let n = i + 1;
        ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{n}"/>"#, 255 + n));
        presentation_rels.push((format!("rId{n}"), format!("slides/slide{n}.xml")));
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        let slide = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/>{body}</p:txBody></p:sp></p:spTree></p:cSld>
</p:sld>"#
        );
        parts.push((format!("ppt/slides/slide{n}.xml"), slide.into_bytes()));
    }
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst>{ids}</p:sldIdLst>
  <p:sldSz cx="{cx}" cy="{cy}"/>
</p:presentation>"#
    );
    let rel_entries: Vec<(&str, &str, &str)> = presentation_rels
        .iter()
        .map(|(id, target)| (id.as_str(), "slide", target.as_str()))
        .collect();

    let mut all: Vec<(&str, Vec<u8>)> = vec![
        (
            "[Content_Types].xml",
            content_types("presentationml.presentation.main", "/ppt/presentation.xml"),
        ),
        ("_rels/.rels", rels(&[("rId1", "officeDocument", "ppt/presentation.xml")])),
        ("ppt/presentation.xml", presentation.into_bytes()),
        ("ppt/_rels/presentation.xml.rels", rels(&rel_entries)),
    ];
    all.extend(parts.iter().map(|(name, data)| (name.as_str(), data.clone())));
    zip_parts(&all)
}

/// One markdown cell and one code cell with a stream output.
pub fn notebook() -> Vec<u8> {
    serde_json::json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["# Analysis\n", "Loading the **data**."]},
            {"cell_type": "code", "metadata": {}, "execution_count": 1,
             "source": ["import math\n", "print(math.pi)"],
             "outputs": [{"output_type": "stream", "name": "stdout", "text": ["3.141592653589793\n"]}]}
        ]
    })
    .to_string()
    .into_bytes()
}

// ── PDF inspection ───────────────────────────────────────────────────────

/// Decoded content operations of every page, in page order.
pub fn page_operations(pdf: &[u8]) -> Vec<Vec<lopdf::content::Operation>> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = doc.get_page_content(*id).unwrap();
            lopdf::content::Content::decode(&content).unwrap().operations
        })
        .collect()
}

/// Number of images painted (`Do`) on each page.
pub fn images_per_page(pdf: &[u8]) -> Vec<usize> {
    page_operations(pdf)
        .iter()
        .map(|ops| ops.iter().filter(|op| op.operator == "Do").count())
        .collect()
}

/// Font resource names selected with `Tf`, in drawing order.
pub fn fonts_used(operations: &[lopdf::content::Operation]) -> Vec<String> {
    operations
        .iter()
        .filter(|op| op.operator == "Tf")
        .filter_map(|op| op.operands.first())
        .filter_map(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .collect()
}
