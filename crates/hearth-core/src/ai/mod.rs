//! Contract with the generative AI collaborator.

mod reply;
mod request;

use async_trait::async_trait;

use crate::error::Result;

pub use reply::{AiReply, ImageReply, ReplyKind, SpeechReply, TextReply};
pub use request::{
    AiRequest, ConversationContext, HISTORY_WINDOW, ImageRequest, JournalRequest,
    ReflectionRequest, SpeechRequest,
};

/// Generates chat replies, images, speech, memory suggestions and journal entries.
///
/// Implementations return the [`AiReply`] variant matching
/// [`AiRequest::expected_reply`], or a `HearthError::Request` on failure.
#[async_trait]
pub trait CompanionService: Send + Sync {
    async fn respond(&self, request: AiRequest) -> Result<AiReply>;
}
