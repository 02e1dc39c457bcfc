//! Archive export abstractions.

mod archive;
mod bundle;

pub use archive::{ArchiveContent, ArchiveEntry, ArchiveWriter};
pub use bundle::{FULL_ARCHIVE_NAME, full_archive_entries};
