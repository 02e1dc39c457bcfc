//! Full data export: the aggregate, a readme and every gallery image.

use crate::error::Result;
use crate::gallery::{GalleryIndex, image_entry_name};
use crate::state::{AppState, to_backup_json};

use super::archive::ArchiveEntry;

pub const FULL_ARCHIVE_NAME: &str = "companion_export.zip";

const README: &str = "Companion data export\n\
=====================\n\
\n\
data.json   Complete session backup (settings, chat history, memories, journal).\n\
            Import it with `hearth backup import data.json`.\n\
images/     Every image from the chat, named after the message that holds it.\n";

/// Builds the entries of a full export archive.
pub fn full_archive_entries(state: &AppState) -> Result<Vec<ArchiveEntry>> {
    let mut entries = vec![
        ArchiveEntry::text("data.json", to_backup_json(state)?),
        ArchiveEntry::text("README.txt", README),
    ];

    let index = GalleryIndex::build(state.chat_history.messages());
    entries.extend(index.items().map(|item| {
        ArchiveEntry::base64(
            format!("images/{}", image_entry_name(&item.message_id)),
            item.image.base64_payload(),
        )
    }));

    Ok(entries)
}
