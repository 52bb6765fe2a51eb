//! Document kinds and the file extensions each one accepts.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The four families of input documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Word processing (`.docx`).
    Word,
    /// Spreadsheets (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
    Excel,
    /// Jupyter notebooks (`.ipynb`).
    Notebook,
    /// Presentations (`.pptx`; `.ppt` is accepted and fails at parse time
    /// unless it is really a PPTX package).
    PowerPoint,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Word,
        DocumentKind::Excel,
        DocumentKind::Notebook,
        DocumentKind::PowerPoint,
    ];

    /// Lower-case extensions (without the dot) accepted for this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            DocumentKind::Word => &["docx"],
            DocumentKind::Excel => &["xlsx", "xlsm", "xlsb", "xls", "ods"],
            DocumentKind::Notebook => &["ipynb"],
            DocumentKind::PowerPoint => &["pptx", "ppt"],
        }
    }

    /// Path segment of the HTTP route, e.g. `word-to-pdf`.
    pub fn route_slug(self) -> &'static str {
        match self {
            DocumentKind::Word => "word-to-pdf",
            DocumentKind::Excel => "excel-to-pdf",
            DocumentKind::Notebook => "ipynb-to-pdf",
            DocumentKind::PowerPoint => "ppt-to-pdf",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Word => "Word",
            DocumentKind::Excel => "Excel",
            DocumentKind::Notebook => "Jupyter notebook",
            DocumentKind::PowerPoint => "PowerPoint",
        }
    }

    /// Infer the kind from a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<DocumentKind> {
        let ext = extension_of(path.as_ref())?;
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
    }

    /// Check that `file_name` carries an extension this kind accepts.
    pub fn check_extension(self, file_name: &str) -> Result<(), ConvertError> {
        let ext = extension_of(Path::new(file_name)).unwrap_or_default();
        if self.extensions().contains(&ext.as_str()) {
            return Ok(());
        }
        Err(ConvertError::UnsupportedExtension {
            extension: ext,
            kind: self.label(),
            expected: self
                .extensions()
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
