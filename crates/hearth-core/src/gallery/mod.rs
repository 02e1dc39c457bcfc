//! Gallery views, tag index and multi-select export.

mod export;
mod index;
mod selection;

pub use export::{GALLERY_ARCHIVE_NAME, export_selected, image_entry_name, selected_entries};
pub use index::{GalleryIndex, GalleryItem, GalleryTab};
pub use selection::GallerySelection;
