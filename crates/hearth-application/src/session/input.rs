use hearth_core::error::{HearthError, Result};
use hearth_core::message::{FileAttachment, ImageAttachment, Message};

/// What the user submits in one turn: text plus at most one attachment.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub text: String,
    pub image: Option<String>,
    pub file: Option<FileAttachment>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attaches an uploaded picture given as a data URI.
    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.image = Some(data_uri.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.file = Some(FileAttachment {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    /// Builds the user message for this input.
    ///
    /// # Errors
    ///
    /// `HearthError::Validation` when the input is empty, carries both an
    /// image and a file, or is an image directive without a prompt.
    pub(crate) fn into_message(self) -> Result<Message> {
        let text = self.text.trim().to_string();
        if text.is_empty() && self.image.is_none() && self.file.is_none() {
            return Err(HearthError::validation("message is empty"));
        }
        if self.image.is_some() && self.file.is_some() {
            return Err(HearthError::validation(
                "a message can carry an image or a file, not both",
            ));
        }

        let mut message = Message::user(text);
        if message.image_directive_prompt().is_some_and(str::is_empty) {
            return Err(HearthError::validation("describe the photo after 'generate a photo:'"));
        }
        if let Some(src) = self.image {
            let alt = message.text.clone();
            message = message.with_image(ImageAttachment::new(src, alt));
        }
        if let Some(file) = self.file {
            message = message.with_file(file);
        }
        Ok(message)
    }
}
