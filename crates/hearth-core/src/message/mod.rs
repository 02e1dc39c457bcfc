//! Chat messages and the ordered message store.

pub mod markup;
mod model;
pub mod ooc;
mod store;

pub use model::{
    FileAttachment, GroundingKind, GroundingSource, IMAGE_DIRECTIVE, ImageAttachment,
    LinkPreview, Message, PlaceAnswerSources, ReviewSnippet, Sender,
};
pub use store::{MessageStore, normalize_tags};
