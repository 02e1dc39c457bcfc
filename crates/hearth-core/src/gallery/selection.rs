use std::collections::BTreeSet;

use super::index::GalleryItem;

/// Multi-select state for gallery export, keyed by owning message id.
///
/// Selections survive tab and filter changes until cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySelection {
    selected: BTreeSet<String>,
}

impl GallerySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the selection of `message_id`; returns whether it is now selected.
    pub fn toggle(&mut self, message_id: &str) -> bool {
        if self.selected.remove(message_id) {
            false
        } else {
            self.selected.insert(message_id.to_string());
            true
        }
    }

    /// Replaces the selection with the currently visible items.
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a GalleryItem>) {
        self.selected = visible
            .into_iter()
            .map(|item| item.message_id.clone())
            .collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.selected.contains(message_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ImageAttachment;

    #[test]
    fn test_toggle() {
        let mut selection = GallerySelection::new();
        assert!(selection.toggle("a"));
        assert!(selection.contains("a"));
        assert!(!selection.toggle("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_replaces() {
        let items: Vec<GalleryItem> = ["x", "y"]
            .iter()
            .map(|id| GalleryItem {
                message_id: id.to_string(),
                image: ImageAttachment::new("data:image/png;base64,AA", ""),
            })
            .collect();

        let mut selection = GallerySelection::new();
        selection.toggle("stale");
        selection.select_all(&items);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
