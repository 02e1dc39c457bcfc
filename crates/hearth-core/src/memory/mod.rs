//! Memories and journal entries.
//!
//! Both are flat lists with independent lifecycles; neither references chat
//! messages directly.

mod entry;

pub(crate) use entry::non_blank;
pub use entry::{JournalEntry, MemoryEntry};

/// Minimum number of chat messages before a reflection is worth requesting.
pub const MIN_REFLECTION_MESSAGES: usize = 5;

/// Drops suggestions that are blank or already stored (case-insensitive), and
/// duplicates within the suggestions themselves.
pub fn filter_new_suggestions(existing: &[MemoryEntry], suggestions: Vec<String>) -> Vec<String> {
    let mut known: Vec<String> = existing
        .iter()
        .map(|m| m.content.trim().to_lowercase())
        .collect();

    suggestions
        .into_iter()
        .filter_map(|suggestion| {
            let trimmed = suggestion.trim();
            let key = trimmed.to_lowercase();
            if trimmed.is_empty() || known.contains(&key) {
                return None;
            }
            known.push(key);
            Some(trimmed.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_new_suggestions() {
        let existing = vec![MemoryEntry::new("Loves hiking").unwrap()];
        let suggestions = vec![
            "loves hiking".to_string(),
            " Has a cat named Miso ".to_string(),
            "has a cat named miso".to_string(),
            "".to_string(),
        ];
        assert_eq!(
            filter_new_suggestions(&existing, suggestions),
            vec!["Has a cat named Miso".to_string()]
        );
    }
}
