//! Companion session orchestration.

mod companion_session;
mod generation;
mod input;

pub use companion_session::{CompanionSession, SessionCollaborators};
pub use input::UserInput;
