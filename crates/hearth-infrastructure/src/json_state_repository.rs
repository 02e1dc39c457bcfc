//! File-backed session state repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hearth_core::error::{HearthError, Result};
use hearth_core::state::{AppState, StateRepository};
use tracing::debug;

use crate::storage::{AtomicFile, FileFormat};

/// Stores each session key as one pretty-printed JSON document in a directory.
///
/// Writes go through [`AtomicFile`], so a crash mid-save leaves the previous
/// document intact. File IO runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct JsonStateRepository {
    dir: PathBuf,
}

impl JsonStateRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }

    fn file(&self, key: &str) -> AtomicFile<AppState> {
        AtomicFile::new(self.path_for(key), FileFormat::Json)
    }
}

#[async_trait]
impl StateRepository for JsonStateRepository {
    async fn load(&self, key: &str) -> Result<Option<AppState>> {
        let file = self.file(key);
        tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| HearthError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn save(&self, key: &str, state: &AppState) -> Result<()> {
        let file = self.file(key);
        let state = state.clone();
        let message_count = state.chat_history.len();

        tokio::task::spawn_blocking(move || file.save(&state))
            .await
            .map_err(|e| HearthError::internal(format!("Failed to join task: {}", e)))??;

        debug!(key, message_count, "Saved session state");
        Ok(())
    }
}
