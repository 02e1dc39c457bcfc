//! Chat message domain model.
//!
//! Field names serialize in camelCase so that backups exported by the browser
//! client (`chatHistory[].modelUrl`, `placeAnswerSources`, ...) load unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::util::{generate_id, iso_to_millis, now_iso};

use super::ooc::is_ooc_message;

/// Literal marker that turns a user message into an image-generation directive.
pub const IMAGE_DIRECTIVE: &str = "generate a photo:";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Message typed or uploaded by the user.
    User,
    /// Message produced by the AI companion.
    Ai,
}

impl Sender {
    fn id_prefix(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

/// Image attached to a message, either uploaded by the user or generated by the companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// Base64 data URI (`data:image/png;base64,...`)
    pub src: String,
    /// Prompt (generated) or accompanying text (uploaded)
    #[serde(default)]
    pub prompt: String,
    /// Creation timestamp of the image itself (ISO 8601)
    pub timestamp: String,
    /// Free-text hashtags, unique, in display order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ImageAttachment {
    /// Creates an image attachment stamped with the current time and no tags.
    pub fn new(src: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            prompt: prompt.into(),
            timestamp: now_iso(),
            tags: Vec::new(),
        }
    }

    /// Image timestamp in Unix milliseconds; unparsable timestamps sort as the epoch.
    pub fn timestamp_millis(&self) -> i64 {
        iso_to_millis(&self.timestamp).unwrap_or(0)
    }

    /// The base64 payload of the data URI (everything after the first comma).
    pub fn base64_payload(&self) -> &str {
        self.src
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(&self.src)
    }

    /// MIME type declared by the data URI, if any.
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.src.strip_prefix("data:")?.split(',').next()?;
        header.split(';').next().filter(|mime| !mime.is_empty())
    }

    /// File name used when downloading this single image.
    pub fn download_name(&self) -> String {
        format!("companion-image-{}.png", self.timestamp_millis())
    }

    /// Exact, case-sensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Text file uploaded alongside a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub content: String,
}

/// Kind of grounding citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundingKind {
    Web,
    Maps,
}

/// A review quoted by a map-place citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReviewSnippet {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSources {
    #[serde(default)]
    pub review_snippets: Vec<ReviewSnippet>,
}

/// A citation attached to an AI response substantiating a factual claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: GroundingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_answer_sources: Option<PlaceAnswerSources>,
}

impl GroundingSource {
    /// Review snippets; only map sources carry them.
    pub fn review_snippets(&self) -> &[ReviewSnippet] {
        match (&self.kind, &self.place_answer_sources) {
            (GroundingKind::Maps, Some(sources)) => &sources.review_snippets,
            _ => &[],
        }
    }
}

/// Link preview metadata attached to an AI response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreview {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A single message in the conversation.
///
/// Lifecycle: created when the user submits input or an AI reply arrives, appended
/// to the [`MessageStore`](super::MessageStore), and afterwards mutated only through
/// text edits, image tag updates or regeneration of an AI reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier within the session (embeds the creation time)
    pub id: String,
    pub sender: Sender,
    /// Message text; may contain `*emphasis*` markup
    pub text: String,
    /// Creation timestamp (ISO 8601)
    pub timestamp: String,
    /// Out-of-character flag
    #[serde(default)]
    pub ooc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<Vec<GroundingSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkPreview>,
}

impl Message {
    fn new(sender: Sender, text: String) -> Self {
        Self {
            id: generate_id(sender.id_prefix()),
            sender,
            text,
            timestamp: now_iso(),
            ooc: false,
            image: None,
            file: None,
            grounding: None,
            model_url: None,
            link: None,
        }
    }

    /// Creates a user message; the OOC flag follows the strict parenthesis rule.
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        let ooc = is_ooc_message(&text);
        Self::new(Sender::User, text).with_ooc(ooc)
    }

    /// Creates an AI message.
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text.into())
    }

    pub fn with_ooc(mut self, ooc: bool) -> Self {
        self.ooc = ooc;
        self
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    /// Attaches grounding citations; an empty list leaves the field unset.
    pub fn with_grounding(mut self, grounding: Vec<GroundingSource>) -> Self {
        self.grounding = if grounding.is_empty() {
            None
        } else {
            Some(grounding)
        };
        self
    }

    pub fn with_link(mut self, link: Option<LinkPreview>) -> Self {
        self.link = link;
        self
    }

    pub fn with_model_url(mut self, model_url: Option<String>) -> Self {
        self.model_url = model_url;
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_ai(&self) -> bool {
        self.sender == Sender::Ai
    }

    /// True when the text starts, case-insensitively, with [`IMAGE_DIRECTIVE`].
    pub fn is_image_directive(&self) -> bool {
        self.image_directive_prompt().is_some()
    }

    /// The prompt following [`IMAGE_DIRECTIVE`], trimmed.
    pub fn image_directive_prompt(&self) -> Option<&str> {
        let marker_len = IMAGE_DIRECTIVE.len();
        let head = self.text.get(..marker_len)?;
        if head.eq_ignore_ascii_case(IMAGE_DIRECTIVE) {
            Some(self.text[marker_len..].trim())
        } else {
            None
        }
    }

    /// Checks the shape invariants of a message.
    ///
    /// # Errors
    ///
    /// Returns `HearthError::Validation` when:
    /// - the id is empty
    /// - a user message carries both an image and a file
    /// - a user message carries AI-only fields (grounding, model, link)
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(HearthError::validation("message id must not be empty"));
        }

        if self.is_user() {
            if self.image.is_some() && self.file.is_some() {
                return Err(HearthError::validation(format!(
                    "user message '{}' carries both an image and a file",
                    self.id
                )));
            }
            if self.grounding.is_some() || self.model_url.is_some() || self.link.is_some() {
                return Err(HearthError::validation(format!(
                    "user message '{}' carries AI-only fields",
                    self.id
                )));
            }
        }

        Ok(())
    }
}
