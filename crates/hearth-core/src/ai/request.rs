//! Requests sent to the AI collaborator.

use serde::Serialize;

use crate::message::Message;
use crate::state::{ArtStyle, CompanionSettings, GeoLocation, VoiceGender};

use super::reply::ReplyKind;

/// Number of prior messages sent as conversation context.
pub const HISTORY_WINDOW: usize = 30;

/// Everything the companion needs to answer the latest user message.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    pub companion: CompanionSettings,
    pub memories: Vec<String>,
    /// Prior messages, oldest first, excluding `latest`
    pub history: Vec<Message>,
    /// The message being answered
    pub latest: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    /// What the user asked to see
    pub prompt: String,
    pub appearance: String,
    pub art_style: ArtStyle,
    /// Data URI of a reference picture of the companion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl ImageRequest {
    /// The full prompt sent to the image model.
    pub fn composed_prompt(&self) -> String {
        format!(
            "Generate a photo: {}. The companion looks like this: {}. Style: {}.",
            self.prompt.trim_end_matches('.'),
            self.appearance.trim_end_matches('.'),
            self.art_style.prompt_phrase()
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    /// Text to speak, already stripped of emphasis markup
    pub text: String,
    pub voice: VoiceGender,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReflectionRequest {
    pub companion: CompanionSettings,
    pub memories: Vec<String>,
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalRequest {
    pub companion: CompanionSettings,
    pub memories: Vec<String>,
    /// Earlier entries, newest first
    pub previous_entries: Vec<String>,
    pub history: Vec<Message>,
}

/// One outbound call to the AI collaborator.
#[derive(Debug, Clone)]
pub enum AiRequest {
    Chat(ConversationContext),
    Image(ImageRequest),
    Speech(SpeechRequest),
    Reflection(ReflectionRequest),
    Journal(JournalRequest),
}

impl AiRequest {
    /// The reply variant a successful call must produce.
    pub fn expected_reply(&self) -> ReplyKind {
        match self {
            AiRequest::Chat(_) => ReplyKind::Text,
            AiRequest::Image(_) => ReplyKind::Image,
            AiRequest::Speech(_) => ReplyKind::Speech,
            AiRequest::Reflection(_) => ReplyKind::MemorySuggestions,
            AiRequest::Journal(_) => ReplyKind::JournalText,
        }
    }
}
