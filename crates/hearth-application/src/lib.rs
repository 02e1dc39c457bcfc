//! Application layer for Hearth.
//!
//! [`CompanionSession`] owns the session aggregate and routes user intents to
//! state mutations, AI requests, playback and export.

pub mod session;

pub use session::{CompanionSession, SessionCollaborators, UserInput};
