//! Ordered chat history with the mutation rules the session relies on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HearthError, Result};

use super::model::{IMAGE_DIRECTIVE, Message, Sender};

/// The ordered list of chat messages.
///
/// Order is append (completion) order. Ids are unique within the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an existing list, rejecting duplicate ids and malformed messages.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self> {
        let mut store = Self::new();
        for message in messages {
            store.append(message)?;
        }
        Ok(store)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    /// Returns the first message id that appears more than once, if any.
    ///
    /// Deserialization does not run the append checks, so imported stores are
    /// verified with this before being accepted.
    pub fn first_duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.messages.len());
        self.messages
            .iter()
            .find(|m| !seen.insert(m.id.as_str()))
            .map(|m| m.id.as_str())
    }

    /// Adds a message to the end of the list.
    ///
    /// # Errors
    ///
    /// `HearthError::Validation` if the id already exists or the message is malformed.
    /// The list is unchanged on error.
    pub fn append(&mut self, message: Message) -> Result<()> {
        message.validate()?;
        if self.contains(&message.id) {
            return Err(HearthError::validation(format!(
                "message id '{}' already exists",
                message.id
            )));
        }
        debug!(message_id = %message.id, sender = ?message.sender, "Appending message");
        self.messages.push(message);
        Ok(())
    }

    /// Replaces the text of a message with `new_text` trimmed.
    ///
    /// Returns `Ok(false)` without touching the message when the trimmed text
    /// equals the current text.
    pub fn edit_text(&mut self, id: &str, new_text: &str) -> Result<bool> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| HearthError::not_found("message", id))?;

        let trimmed = new_text.trim();
        if trimmed == message.text {
            return Ok(false);
        }
        message.text = trimmed.to_string();
        Ok(true)
    }

    /// Whether the AI message at `index` may be regenerated.
    ///
    /// True iff the message is from the AI, is not the first message, follows a
    /// user message, and that user message is not an image directive.
    pub fn is_regeneratable(&self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        let (Some(current), Some(previous)) =
            (self.messages.get(index), self.messages.get(index - 1))
        else {
            return false;
        };

        current.sender == Sender::Ai
            && previous.sender == Sender::User
            && !starts_with_directive(&previous.text)
    }

    /// Replaces the tags on a message's image with the normalized `tags`.
    ///
    /// Returns the tags as stored.
    pub fn update_image_tags<I, S>(&mut self, message_id: &str, tags: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| HearthError::not_found("message", message_id))?;
        let image = message
            .image
            .as_mut()
            .ok_or_else(|| HearthError::not_found("image attachment", message_id))?;

        image.tags = normalize_tags(tags);
        debug!(message_id, tag_count = image.tags.len(), "Updated image tags");
        Ok(image.tags.clone())
    }

    /// Rewrites an AI message in place with the content of `reply`.
    ///
    /// The id and position of the original are kept, so the conversation reads
    /// as if the new reply had been given the first time.
    pub fn replace_reply(&mut self, id: &str, reply: Message) -> Result<()> {
        if reply.sender != Sender::Ai {
            return Err(HearthError::validation("replacement reply must come from the AI"));
        }
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| HearthError::not_found("message", id))?;
        if message.sender != Sender::Ai {
            return Err(HearthError::validation(format!(
                "message '{}' is not an AI reply",
                id
            )));
        }

        *message = Message {
            id: message.id.clone(),
            ..reply
        };
        Ok(())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

fn starts_with_directive(text: &str) -> bool {
    text.get(..IMAGE_DIRECTIVE.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(IMAGE_DIRECTIVE))
}

/// Normalizes user-entered tags.
///
/// Leading `#` characters and surrounding whitespace are stripped, empty tags
/// are dropped, and duplicates are removed keeping the first occurrence.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter_map(|tag| {
            let cleaned = tag.as_ref().trim().trim_start_matches('#').trim();
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        })
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
