//! Domain core of the Hearth AI companion.
//!
//! Holds the session aggregate and its entities (messages, memories, journal,
//! gallery), the playback controller, and the traits for the collaborators the
//! application layer wires in: the AI service, persistence, archive writing and
//! audio output.

pub mod ai;
pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod gallery;
pub mod memory;
pub mod message;
pub mod state;
pub mod util;

// Re-export common error type
pub use error::{HearthError, Result};
