//! Static file retrieval confined to one root directory.

use std::io;
use std::path::{Path, PathBuf};

/// Reads files relative to a fixed root, refusing anything that resolves outside it.
#[derive(Debug, Clone)]
pub struct FileReader {
    root: PathBuf,
}

impl FileReader {
    /// The root is canonicalized once, so symlinked roots compare correctly later.
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: std::fs::canonicalize(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Contents of `relative_name`, or `None` if it is missing, not a regular file,
    /// unreadable, or outside the root.
    pub async fn read_file(&self, relative_name: &str) -> Option<Vec<u8>> {
        let candidate = self.root.join(relative_name.trim_start_matches('/'));

        // Canonicalize before the containment check so `..` and symlinks cannot escape.
        let canonical = tokio::fs::canonicalize(&candidate).await.ok()?;
        if !canonical.starts_with(&self.root) {
            tracing::warn!("Refusing file outside static root: {}", candidate.display());
            return None;
        }
        if !tokio::fs::metadata(&canonical).await.ok()?.is_file() {
            return None;
        }

        match tokio::fs::read(&canonical).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", canonical.display(), e);
                None
            }
        }
    }
}

/// Content type for a file name, by suffix. Unknown or missing suffixes are plain text.
pub fn content_type(file_name: &str) -> &'static str {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or("text/plain")
}
