//! Zip implementation of the archive writer.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hearth_core::error::{HearthError, Result};
use hearth_core::export::{ArchiveContent, ArchiveEntry, ArchiveWriter};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::storage::atomic_file::temp_path;

/// Writes Deflate-compressed zip archives into a fixed output directory.
#[derive(Debug, Clone)]
pub struct ZipArchiveWriter {
    output_dir: PathBuf,
}

impl ZipArchiveWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ArchiveWriter for ZipArchiveWriter {
    async fn write_archive(&self, archive_name: &str, entries: Vec<ArchiveEntry>) -> Result<PathBuf> {
        let file_name = Path::new(archive_name)
            .file_name()
            .ok_or_else(|| HearthError::validation(format!("invalid archive name '{}'", archive_name)))?;
        let path = self.output_dir.join(file_name);
        let entry_count = entries.len();

        let written = path.clone();
        tokio::task::spawn_blocking(move || write_zip(&written, entries))
            .await
            .map_err(|e| HearthError::internal(format!("Failed to join task: {}", e)))??;

        info!(path = %path.display(), entry_count, "Wrote archive");
        Ok(path)
    }
}

/// Writes the archive to a temporary sibling and renames it into place, so a
/// failed export never leaves a truncated zip at `path`.
fn write_zip(path: &Path, entries: Vec<ArchiveEntry>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path)?;

    let result = write_entries(&tmp_path, entries);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        return result;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn write_entries(path: &Path, entries: Vec<ArchiveEntry>) -> Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        let bytes = match entry.content {
            ArchiveContent::Text(text) => text.into_bytes(),
            ArchiveContent::Base64(data) => STANDARD.decode(data.trim()).map_err(|e| {
                HearthError::validation(format!("entry '{}' is not valid base64: {}", entry.name, e))
            })?,
        };

        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| HearthError::io(format!("failed to add '{}': {}", entry.name, e)))?;
        zip.write_all(&bytes)?;
    }

    let file = zip
        .finish()
        .map_err(|e| HearthError::io(format!("failed to finish archive: {}", e)))?;
    file.sync_all()?;
    Ok(())
}
