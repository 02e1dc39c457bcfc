use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::util::{generate_id, now_iso};

/// A fact the companion remembers about the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub content: String,
    /// Creation date (ISO 8601)
    pub date: String,
}

impl MemoryEntry {
    /// Creates a memory from user or reflection text.
    ///
    /// # Errors
    ///
    /// `HearthError::Validation` when the content is blank.
    pub fn new(content: &str) -> Result<Self> {
        Ok(Self {
            id: generate_id("memory"),
            content: non_blank(content, "memory")?,
            date: now_iso(),
        })
    }
}

/// A diary entry written by the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: String,
    pub content: String,
}

impl JournalEntry {
    pub fn new(content: &str) -> Result<Self> {
        Ok(Self {
            id: generate_id("journal"),
            date: now_iso(),
            content: non_blank(content, "journal entry")?,
        })
    }
}

/// Trims `content`, rejecting blank input.
pub(crate) fn non_blank(content: &str, what: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(HearthError::validation(format!("{} content must not be empty", what)));
    }
    Ok(trimmed.to_string())
}
