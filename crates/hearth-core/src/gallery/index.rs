//! Derived views over the images attached to chat messages.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::message::{ImageAttachment, Message, Sender};

/// Which gallery view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryTab {
    /// Images produced by the companion
    #[default]
    Generated,
    /// Images uploaded by the user
    Uploaded,
}

/// An image together with the id of the message that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub message_id: String,
    pub image: ImageAttachment,
}

/// Two disjoint views of every image in the conversation.
///
/// Each view is sorted newest first by the image's own timestamp. The index is
/// a snapshot; rebuild it after the message list changes.
#[derive(Debug, Clone, Default)]
pub struct GalleryIndex {
    generated: Vec<GalleryItem>,
    uploaded: Vec<GalleryItem>,
}

impl GalleryIndex {
    pub fn build(messages: &[Message]) -> Self {
        let mut index = Self::default();
        for message in messages {
            let Some(image) = &message.image else {
                continue;
            };
            let item = GalleryItem {
                message_id: message.id.clone(),
                image: image.clone(),
            };
            match message.sender {
                Sender::Ai => index.generated.push(item),
                Sender::User => index.uploaded.push(item),
            }
        }

        // Stable sort keeps message order for equal timestamps.
        index
            .generated
            .sort_by_key(|item| Reverse(item.image.timestamp_millis()));
        index
            .uploaded
            .sort_by_key(|item| Reverse(item.image.timestamp_millis()));
        index
    }

    pub fn generated(&self) -> &[GalleryItem] {
        &self.generated
    }

    pub fn uploaded(&self) -> &[GalleryItem] {
        &self.uploaded
    }

    pub fn tab(&self, tab: GalleryTab) -> &[GalleryItem] {
        match tab {
            GalleryTab::Generated => &self.generated,
            GalleryTab::Uploaded => &self.uploaded,
        }
    }

    /// Items of `tab`, restricted to those carrying `filter` when it is a non-empty tag.
    pub fn view(&self, tab: GalleryTab, filter: Option<&str>) -> Vec<&GalleryItem> {
        let items = self.tab(tab).iter();
        match filter.filter(|tag| !tag.is_empty()) {
            Some(tag) => items.filter(|item| item.image.has_tag(tag)).collect(),
            None => items.collect(),
        }
    }

    /// Union of tags across both views, sorted ascending.
    pub fn all_tags(&self) -> Vec<String> {
        self.items()
            .flat_map(|item| item.image.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All items, generated first.
    pub fn items(&self) -> impl Iterator<Item = &GalleryItem> {
        self.generated.iter().chain(self.uploaded.iter())
    }

    pub fn find(&self, message_id: &str) -> Option<&GalleryItem> {
        self.items().find(|item| item.message_id == message_id)
    }

    pub fn len(&self) -> usize {
        self.generated.len() + self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_message(sender: Sender, timestamp: &str, tags: &[&str]) -> Message {
        let image = ImageAttachment {
            src: "data:image/png;base64,AAAA".to_string(),
            prompt: String::new(),
            timestamp: timestamp.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        let message = match sender {
            Sender::User => Message::user("upload"),
            Sender::Ai => Message::ai("generated"),
        };
        message.with_image(image)
    }

    #[test]
    fn test_views_are_disjoint_and_sorted_desc() {
        let messages = vec![
            image_message(Sender::Ai, "2024-01-01T00:00:01.000Z", &[]),
            image_message(Sender::Ai, "2024-01-01T00:00:03.000Z", &[]),
            image_message(Sender::User, "2024-01-01T00:00:05.000Z", &[]),
            image_message(Sender::Ai, "2024-01-01T00:00:02.000Z", &[]),
            Message::ai("no image"),
        ];
        let index = GalleryIndex::build(&messages);

        let stamps: Vec<&str> = index
            .generated()
            .iter()
            .map(|i| i.image.timestamp.as_str())
            .collect();
        assert_eq!(
            stamps,
            vec![
                "2024-01-01T00:00:03.000Z",
                "2024-01-01T00:00:02.000Z",
                "2024-01-01T00:00:01.000Z",
            ]
        );
        assert_eq!(index.uploaded().len(), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_tag_filter_selects_exact_match() {
        let messages = vec![
            image_message(Sender::Ai, "2024-01-01T00:00:01.000Z", &["beach"]),
            image_message(Sender::Ai, "2024-01-01T00:00:02.000Z", &["city"]),
            image_message(Sender::Ai, "2024-01-01T00:00:03.000Z", &[]),
            image_message(Sender::User, "2024-01-01T00:00:04.000Z", &["Beach"]),
            image_message(Sender::User, "2024-01-01T00:00:05.000Z", &["home"]),
        ];
        let index = GalleryIndex::build(&messages);

        let generated = index.view(GalleryTab::Generated, Some("beach"));
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].message_id, messages[0].id);
        assert!(index.view(GalleryTab::Uploaded, Some("beach")).is_empty());

        assert_eq!(index.view(GalleryTab::Generated, Some("")).len(), 3);
        assert_eq!(index.view(GalleryTab::Uploaded, None).len(), 2);
    }

    #[test]
    fn test_all_tags_sorted_union() {
        let messages = vec![
            image_message(Sender::Ai, "2024-01-01T00:00:01.000Z", &["sunset", "beach"]),
            image_message(Sender::User, "2024-01-01T00:00:02.000Z", &["beach", "cafe"]),
        ];
        let index = GalleryIndex::build(&messages);
        assert_eq!(index.all_tags(), vec!["beach", "cafe", "sunset"]);
    }
}
