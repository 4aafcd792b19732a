//! The directory of saved HTML pages offered by the interactive file picker.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ensure_dir;
use crate::{QuireError, Result};

/// Prefix given to files whose book was delivered.
pub const SENT_PREFIX: &str = "[SENT] ";

#[derive(Debug, Clone)]
pub struct HtmlLibrary {
    dir: PathBuf,
}

impl HtmlLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `*.html` files in the directory, sorted by name. The directory is
    /// created when missing.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// The file shown at 1-based position `index` by [`list`](Self::list).
    pub fn select(&self, index: usize) -> Result<PathBuf> {
        let files = self.list()?;
        index
            .checked_sub(1)
            .and_then(|i| files.get(i).cloned())
            .ok_or_else(|| QuireError::ConfigError(format!("no file at position {index}, {} available", files.len())))
    }
}

/// Renames `path` to carry [`SENT_PREFIX`] and returns the new path. Files
/// already marked are left alone.
pub fn mark_sent(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| QuireError::FileNotFound(path.to_path_buf()))?;

    if name.starts_with(SENT_PREFIX) {
        return Ok(path.to_path_buf());
    }

    let renamed = path.with_file_name(format!("{SENT_PREFIX}{name}"));
    fs::rename(path, &renamed)?;
    tracing::debug!(from = %path.display(), to = %renamed.display(), "marked as sent");
    Ok(renamed)
}
