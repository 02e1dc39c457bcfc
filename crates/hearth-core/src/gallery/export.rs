//! Batch export of selected gallery images.

use std::path::PathBuf;

use tracing::info;

use crate::error::{HearthError, Result};
use crate::export::{ArchiveEntry, ArchiveWriter};

use super::index::GalleryIndex;
use super::selection::GallerySelection;

pub const GALLERY_ARCHIVE_NAME: &str = "companion_gallery_export.zip";

/// Archive entry name for the image owned by `message_id`.
///
/// Bytes outside `[A-Za-z0-9_-]` are written as `%XX`, so imported ids cannot
/// escape the archive root and distinct ids never share an entry.
pub fn image_entry_name(message_id: &str) -> String {
    let mut safe = String::with_capacity(message_id.len());
    for byte in message_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            safe.push(byte as char);
        } else {
            safe.push_str(&format!("%{:02X}", byte));
        }
    }
    format!("image_{}.png", safe)
}

/// Archive entries for the selected images, in gallery order across both tabs.
///
/// Selected ids with no image in the index are skipped.
pub fn selected_entries(index: &GalleryIndex, selection: &GallerySelection) -> Vec<ArchiveEntry> {
    index
        .items()
        .filter(|item| selection.contains(&item.message_id))
        .map(|item| {
            ArchiveEntry::base64(
                image_entry_name(&item.message_id),
                item.image.base64_payload(),
            )
        })
        .collect()
}

/// Bundles the selected images into [`GALLERY_ARCHIVE_NAME`].
///
/// The selection is cleared whether or not the archive is written.
///
/// # Errors
///
/// - `HearthError::Validation` if nothing selected maps to an image
/// - whatever the writer reports
pub async fn export_selected(
    index: &GalleryIndex,
    selection: &mut GallerySelection,
    writer: &dyn ArchiveWriter,
) -> Result<PathBuf> {
    let entries = selected_entries(index, selection);
    selection.clear();

    if entries.is_empty() {
        return Err(HearthError::validation("no images selected for export"));
    }

    let count = entries.len();
    let path = writer.write_archive(GALLERY_ARCHIVE_NAME, entries).await?;
    info!(count, path = %path.display(), "Exported gallery images");
    Ok(path)
}
