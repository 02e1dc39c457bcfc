//! Reading and writing backup documents on disk.

use std::path::Path;

use hearth_core::error::{HearthError, Result};
use hearth_core::state::{AppState, parse_backup, to_backup_json};
use tokio::fs;
use tracing::info;

/// Reads and validates a backup file.
///
/// # Errors
///
/// - `HearthError::Io` if the file cannot be read
/// - `HearthError::Import` if the content is not an acceptable backup
pub async fn read_backup(path: &Path) -> Result<AppState> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        HearthError::io(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_backup(&content)
}

/// Writes the aggregate as a pretty-printed backup document.
pub async fn write_backup(path: &Path, state: &AppState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = to_backup_json(state)?;
    fs::write(path, json.as_bytes()).await?;
    info!(path = %path.display(), bytes = json.len(), "Wrote backup");
    Ok(())
}
