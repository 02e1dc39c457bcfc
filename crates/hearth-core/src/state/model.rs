//! The companion session aggregate.

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::memory::{JournalEntry, MemoryEntry, non_blank};
use crate::message::MessageStore;

use super::settings::{CompanionSettings, GeoLocation, InterfaceSettings, TtsConfig};

/// Root aggregate of one companion session.
///
/// Persisted and restored wholesale. The JSON layout (`companionSettings`,
/// `chatHistory`, ...) matches backups produced by the browser client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub companion_settings: CompanionSettings,
    #[serde(default)]
    pub interface_settings: InterfaceSettings,
    #[serde(default)]
    pub tts_config: TtsConfig,
    #[serde(default)]
    pub chat_history: MessageStore,
    #[serde(default)]
    pub memories: Vec<MemoryEntry>,
    /// Newest first
    #[serde(default)]
    pub journal: Vec<JournalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<GeoLocation>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory contents in stored order.
    pub fn memory_texts(&self) -> Vec<String> {
        self.memories.iter().map(|m| m.content.clone()).collect()
    }

    pub fn add_memory(&mut self, content: &str) -> Result<MemoryEntry> {
        let entry = MemoryEntry::new(content)?;
        self.memories.push(entry.clone());
        Ok(entry)
    }

    pub fn update_memory(&mut self, id: &str, content: &str) -> Result<()> {
        let content = non_blank(content, "memory")?;
        let entry = self
            .memories
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| HearthError::not_found("memory", id))?;
        entry.content = content;
        Ok(())
    }

    pub fn delete_memory(&mut self, id: &str) -> Result<MemoryEntry> {
        let index = self
            .memories
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| HearthError::not_found("memory", id))?;
        Ok(self.memories.remove(index))
    }

    /// Inserts a journal entry at the front of the journal.
    pub fn push_journal_entry(&mut self, entry: JournalEntry) {
        self.journal.insert(0, entry);
    }

    pub fn update_journal_entry(&mut self, id: &str, content: &str) -> Result<()> {
        let content = non_blank(content, "journal entry")?;
        let entry = self
            .journal
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| HearthError::not_found("journal entry", id))?;
        entry.content = content;
        Ok(())
    }
}
