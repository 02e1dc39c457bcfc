//! Backup document validation.

use serde_json::Value;
use tracing::warn;

use crate::error::{HearthError, Result};

use super::model::AppState;

/// Top-level keys that identify a document as a companion backup.
pub const BACKUP_MARKER_FIELDS: [&str; 2] = ["companionSettings", "chatHistory"];

/// Parses and validates a backup document.
///
/// A backup is accepted when it is a JSON object with a non-null
/// `companionSettings` or `chatHistory`, deserializes into [`AppState`],
/// contains no duplicate message ids, and every message passes validation.
///
/// # Errors
///
/// `HearthError::Import` describing the first problem found.
pub fn parse_backup(json: &str) -> Result<AppState> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| HearthError::import(format!("backup is not valid JSON: {}", e)))?;
    validate_backup(value)
}

/// Validates an already-parsed backup document. See [`parse_backup`].
pub fn validate_backup(value: Value) -> Result<AppState> {
    let object = value
        .as_object()
        .ok_or_else(|| HearthError::import("backup must be a JSON object"))?;

    let has_marker = BACKUP_MARKER_FIELDS
        .iter()
        .any(|field| object.get(*field).is_some_and(|v| !v.is_null()));
    if !has_marker {
        return Err(HearthError::import(
            "backup contains neither companionSettings nor chatHistory",
        ));
    }

    let state: AppState = serde_json::from_value(value)
        .map_err(|e| HearthError::import(format!("backup has an unexpected shape: {}", e)))?;

    if let Some(id) = state.chat_history.first_duplicate_id() {
        warn!(message_id = id, "Rejecting backup with duplicate message id");
        return Err(HearthError::import(format!("duplicate message id '{}'", id)));
    }

    for message in state.chat_history.messages() {
        message
            .validate()
            .map_err(|e| HearthError::import(e.to_string()))?;
    }

    Ok(state)
}

/// Serializes the aggregate as a pretty-printed backup document.
pub fn to_backup_json(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_markers() {
        let err = parse_backup(r#"{"memories": []}"#).unwrap_err();
        assert!(err.is_import());

        let err = parse_backup(r#"{"companionSettings": null}"#).unwrap_err();
        assert!(err.is_import());
    }

    #[test]
    fn test_rejects_non_object_and_garbage() {
        assert!(parse_backup("[1, 2]").unwrap_err().is_import());
        assert!(parse_backup("not json").unwrap_err().is_import());
    }

    #[test]
    fn test_accepts_settings_only() {
        let state = parse_backup(r#"{"companionSettings": {"name": "Kai"}}"#).unwrap();
        assert_eq!(state.companion_settings.name, "Kai");
        assert!(state.chat_history.is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = r#"{"chatHistory": [
            {"id": "m1", "sender": "user", "text": "a", "timestamp": "2024-01-01T00:00:00.000Z"},
            {"id": "m1", "sender": "ai", "text": "b", "timestamp": "2024-01-01T00:00:01.000Z"}
        ]}"#;
        let err = parse_backup(json).unwrap_err();
        assert!(err.is_import());
        assert!(err.to_string().contains("m1"));
    }

    #[test]
    fn test_export_then_import_keeps_messages() {
        let mut state = AppState::new();
        state
            .chat_history
            .append(crate::message::Message::user("hello"))
            .unwrap();
        let restored = parse_backup(&to_backup_json(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }
}
