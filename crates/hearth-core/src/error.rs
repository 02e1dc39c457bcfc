//! Error types for the Hearth companion core.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the entire Hearth workspace.
///
/// Every failure in the core is local and recoverable: callers surface it to the
/// user as a dismissable message and the session keeps running.
#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum HearthError {
    /// Input violates a domain invariant (duplicate id, malformed message, empty content)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Audio decode or playback start failed
    #[error("Playback error: {0}")]
    Playback(String),

    /// A backup document was rejected
    #[error("Import error: {0}")]
    Import(String),

    /// The AI service collaborator failed
    #[error("Request error: {}", .message.as_deref().unwrap_or("the AI service did not respond"))]
    Request {
        message: Option<String>,
        status_code: Option<u16>,
        is_retryable: bool,
    },

    /// A response is already being generated
    #[error("A response is already being generated")]
    Busy,

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HearthError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Playback error
    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback(message.into())
    }

    /// Creates an Import error
    pub fn import(message: impl Into<String>) -> Self {
        Self::Import(message.into())
    }

    /// Creates a Request error carrying a human-readable message
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: Some(message.into()),
            status_code: None,
            is_retryable: false,
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Playback error
    pub fn is_playback(&self) -> bool {
        matches!(self, Self::Playback(_))
    }

    /// Check if this is an Import error
    pub fn is_import(&self) -> bool {
        matches!(self, Self::Import(_))
    }

    /// Check if this is a Request error
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// Check if this error was caused by a generation already in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Message suitable for a dismissable notice in the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request {
                message: Some(message),
                ..
            } => format!("Could not reach your companion: {}", message),
            Self::Busy => "Please wait for the current reply to finish.".to_string(),
            Self::Import(_) => {
                "Import failed. The file might be corrupted or in an incompatible format."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for HearthError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for HearthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for HearthError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for HearthError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, HearthError>`.
pub type Result<T> = std::result::Result<T, HearthError>;
