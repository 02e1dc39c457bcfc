//! Replies from the AI collaborator, one variant per request kind.

use std::fmt;

use crate::error::{HearthError, Result};
use crate::audio::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use crate::message::{GroundingSource, LinkPreview};

/// Discriminant of [`AiReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Text,
    Image,
    Speech,
    MemorySuggestions,
    JournalText,
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyKind::Text => "text",
            ReplyKind::Image => "image",
            ReplyKind::Speech => "speech",
            ReplyKind::MemorySuggestions => "memory suggestions",
            ReplyKind::JournalText => "journal text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextReply {
    pub text: String,
    pub grounding: Vec<GroundingSource>,
    pub link: Option<LinkPreview>,
    pub model_url: Option<String>,
}

impl TextReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageReply {
    pub mime_type: String,
    /// Base64 image bytes
    pub data: String,
    /// Text the model returned alongside the image
    pub caption: Option<String>,
}

impl ImageReply {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechReply {
    /// Base64 signed 16-bit little-endian PCM
    pub pcm_base64: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SpeechReply {
    /// Speech at the synthesis service's native format.
    pub fn new(pcm_base64: impl Into<String>) -> Self {
        Self {
            pcm_base64: pcm_base64.into(),
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: SPEECH_CHANNELS,
        }
    }
}

/// Result of one AI call.
#[derive(Debug, Clone, PartialEq)]
pub enum AiReply {
    Text(TextReply),
    Image(ImageReply),
    Speech(SpeechReply),
    MemorySuggestions(Vec<String>),
    JournalText(String),
}

impl AiReply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            AiReply::Text(_) => ReplyKind::Text,
            AiReply::Image(_) => ReplyKind::Image,
            AiReply::Speech(_) => ReplyKind::Speech,
            AiReply::MemorySuggestions(_) => ReplyKind::MemorySuggestions,
            AiReply::JournalText(_) => ReplyKind::JournalText,
        }
    }

    fn mismatch(&self, expected: ReplyKind) -> HearthError {
        HearthError::request(format!(
            "expected a {} reply but received {}",
            expected,
            self.kind()
        ))
    }

    pub fn into_text(self) -> Result<TextReply> {
        match self {
            AiReply::Text(reply) => Ok(reply),
            other => Err(other.mismatch(ReplyKind::Text)),
        }
    }

    pub fn into_image(self) -> Result<ImageReply> {
        match self {
            AiReply::Image(reply) => Ok(reply),
            other => Err(other.mismatch(ReplyKind::Image)),
        }
    }

    pub fn into_speech(self) -> Result<SpeechReply> {
        match self {
            AiReply::Speech(reply) => Ok(reply),
            other => Err(other.mismatch(ReplyKind::Speech)),
        }
    }

    pub fn into_memory_suggestions(self) -> Result<Vec<String>> {
        match self {
            AiReply::MemorySuggestions(suggestions) => Ok(suggestions),
            other => Err(other.mismatch(ReplyKind::MemorySuggestions)),
        }
    }

    pub fn into_journal_text(self) -> Result<String> {
        match self {
            AiReply::JournalText(text) => Ok(text),
            other => Err(other.mismatch(ReplyKind::JournalText)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_is_request_error() {
        let err = AiReply::JournalText("dear diary".to_string())
            .into_text()
            .unwrap_err();
        assert!(err.is_request());
        assert!(err.to_string().contains("expected a text reply but received journal text"));
    }

    #[test]
    fn test_image_data_uri() {
        let reply = ImageReply {
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
            caption: None,
        };
        assert_eq!(reply.data_uri(), "data:image/png;base64,QUJD");
    }
}
