//! JSON persistence for section records
//!
//! Records are written as one pretty-printed JSON array per output file.
//! Each element is a flat object keyed by `Disease` plus the canonical
//! section names that were found.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::sections::SectionRecord;

/// How an existing output file is treated on save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file contents
    #[default]
    Overwrite,
    /// Keep existing records and add the new ones after them
    Append,
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for crate::error::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => crate::error::Error::Io(e),
            StorageError::Json(e) => crate::error::Error::Json(e),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Record file on disk
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Storage backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records; a missing file holds none
    pub async fn load(&self) -> Result<Vec<SectionRecord>> {
        if !fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "No existing record file");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write `records` according to `mode`, returning how many records the
    /// file holds afterwards
    pub async fn save(&self, records: &[SectionRecord], mode: WriteMode) -> Result<usize> {
        let total = match mode {
            WriteMode::Overwrite => {
                self.write_all(records).await?;
                records.len()
            }
            WriteMode::Append => {
                let mut existing = self.load().await?;
                existing.extend_from_slice(records);
                self.write_all(&existing).await?;
                existing.len()
            }
        };
        info!(
            path = %self.path.display(),
            written = records.len(),
            total,
            ?mode,
            "Saved records"
        );
        Ok(total)
    }

    async fn write_all(&self, records: &[SectionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
