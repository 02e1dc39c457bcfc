use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

/// Payload of a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveContent {
    Text(String),
    /// Base64 data, decoded by the writer
    Base64(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated
    pub name: String,
    pub content: ArchiveContent,
}

impl ArchiveEntry {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: ArchiveContent::Text(text.into()),
        }
    }

    pub fn base64(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: ArchiveContent::Base64(data.into()),
        }
    }
}

/// Writes a set of entries into a single archive file.
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    /// Writes `entries` into an archive called `archive_name` and returns its path.
    async fn write_archive(&self, archive_name: &str, entries: Vec<ArchiveEntry>) -> Result<PathBuf>;
}
