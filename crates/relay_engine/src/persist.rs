use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory unusable: {0}")]
    Parent(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create the directory holding `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<PathBuf, PersistError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if parent.exists() {
        if !parent.is_dir() {
            return Err(PersistError::Parent(format!(
                "{} is not a directory",
                parent.display()
            )));
        }
    } else {
        fs::create_dir_all(&parent).map_err(|e| PersistError::Parent(e.to_string()))?;
    }
    Ok(parent)
}

/// Replaces a single file atomically: a sibling temp file is written, synced,
/// then renamed over the target. Readers never see a half-written state file.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: PathBuf) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        let parent = ensure_parent_dir(&self.target)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&self.target).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}
