//! Per-request scratch directories.
//!
//! Every upload gets its own `office2pdf-XXXXXX` directory under the
//! configured temp root, holding the uploaded file and `converted.pdf`.
//! Deletion is retried a few times because another process (a virus
//! scanner, an indexer) may briefly hold the file open.

use crate::error::ConvertError;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Fixed name of the generated PDF inside a workspace.
pub const OUTPUT_FILE_NAME: &str = "converted.pdf";

/// Scratch directory owned by one request.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl RequestWorkspace {
    /// Create a fresh directory under `root` for an upload named `original_name`.
    pub fn create(root: &Path, original_name: &str) -> Result<Self, ConvertError> {
        let dir = tempfile::Builder::new()
            .prefix("office2pdf-")
            .tempdir_in(root)
            .map_err(|e| ConvertError::io(root, e))?;
        let input_path = dir.path().join(sanitize_file_name(original_name));
        let output_path = dir.path().join(OUTPUT_FILE_NAME);
        debug!("Workspace {}", dir.path().display());
        Ok(Self {
            dir,
            input_path,
            output_path,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Delete both files (retrying) and then the directory.
    ///
    /// Never fails: problems are logged and the `TempDir` drop makes a last
    /// attempt.
    pub async fn cleanup(self, attempts: u32, delay: Duration) {
        for path in [&self.input_path, &self.output_path] {
            if let Err(e) = remove_with_retry(path, attempts, delay).await {
                warn!("Could not delete {}: {}", path.display(), e);
            }
        }
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Could not remove workspace {}: {}", dir.display(), e);
        }
    }
}

/// Remove `path`, retrying up to `attempts` times with `delay` between tries.
///
/// A file that does not exist counts as removed.
pub async fn remove_with_retry(path: &Path, attempts: u32, delay: Duration) -> io::Result<()> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match tokio::fs::remove_file(path).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < attempts => {
                debug!(
                    "Delete attempt {}/{} for {} failed: {}",
                    attempt,
                    attempts,
                    path.display(),
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Reduce an uploaded file name to a safe final path component.
///
/// Directory parts are dropped and characters outside `[A-Za-z0-9._-]`
/// become `_`. An empty result becomes `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}
