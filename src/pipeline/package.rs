//! Office Open XML packages: zip containers of XML parts linked by
//! relationship files.

use crate::error::ConvertError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub kind: String,
    /// Package path of the target, already resolved against the source part.
    pub target: String,
    pub external: bool,
}

/// Largest decompressed part read from a package.
pub const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

/// An opened package, read from memory.
pub struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    kind: &'static str,
    max_part_bytes: u64,
}

impl<'a> Package<'a> {
    /// Open `bytes` as a zip package. `name` and `kind` only feed error messages.
    pub fn open(bytes: &'a [u8], name: &str, kind: &'static str) -> Result<Self, ConvertError> {
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ConvertError::InvalidPackage {
            name: name.to_string(),
            kind,
            detail: e.to_string(),
        })?;
        Ok(Self {
            archive,
            kind,
            max_part_bytes: MAX_PART_BYTES,
        })
    }

    /// Override the decompressed size limit for single parts.
    pub fn with_part_limit(mut self, bytes: u64) -> Self {
        self.max_part_bytes = bytes;
        self
    }

    pub fn contains(&self, part: &str) -> bool {
        self.archive.index_for_name(part).is_some()
    }

    pub fn read_bytes(&mut self, part: &str) -> Result<Vec<u8>, ConvertError> {
        let mut file = self.archive.by_name(part).map_err(|_| ConvertError::MissingPart {
            part: part.to_string(),
            kind: self.kind,
        })?;
        let limit = self.max_part_bytes;
        let too_large = || ConvertError::PartTooLarge {
            part: part.to_string(),
            limit,
        };
        if file.size() > limit {
            return Err(too_large());
        }
        // The declared size can lie, so the read is capped as well.
        let mut buf = Vec::with_capacity(file.size() as usize);
        (&mut file)
            .take(limit + 1)
            .read_to_end(&mut buf)
            .map_err(|e| ConvertError::io(part, e))?;
        if buf.len() as u64 > limit {
            return Err(too_large());
        }
        Ok(buf)
    }

    pub fn read_string(&mut self, part: &str) -> Result<String, ConvertError> {
        let bytes = self.read_bytes(part)?;
        String::from_utf8(bytes).map_err(|e| ConvertError::Xml {
            part: part.to_string(),
            detail: e.to_string(),
        })
    }

    /// Relationships of `part`, keyed by id. A part without a `.rels` file
    /// has no relationships.
    pub fn relationships(&mut self, part: &str) -> Result<HashMap<String, Relationship>, ConvertError> {
        let rels_part = rels_path(part);
        if !self.contains(&rels_part) {
            return Ok(HashMap::new());
        }
        let xml = self.read_string(&rels_part)?;
        parse_relationships(&xml, part, &rels_part)
    }
}

/// `word/document.xml` → `word/_rels/document.xml.rels`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target relative to the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn parse_relationships(
    xml: &str,
    source_part: &str,
    rels_part: &str,
) -> Result<HashMap<String, Relationship>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut kind = String::new();
                let mut target = String::new();
                let mut external = false;
                for attr in e.attributes().flatten() {
                    let Ok(value) = attr.decode_and_unescape_value(&reader) else {
                        continue;
                    };
                    match attr.key.as_ref() {
                        b"Id" => id = value.into_owned(),
                        b"Type" => kind = value.into_owned(),
                        b"Target" => target = value.into_owned(),
                        b"TargetMode" => external = value == "External",
                        _ => {}
                    }
                }
                if !id.is_empty() {
                    let target = if external {
                        target
                    } else {
                        resolve_target(source_part, &target)
                    };
                    rels.insert(id, Relationship { kind, target, external });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::Xml {
                    part: rels_part.to_string(),
                    detail: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}
