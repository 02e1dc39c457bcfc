//! Outbound AI integration for the companion.

pub mod gemini_companion_service;
pub mod prompts;

pub use gemini_companion_service::GeminiCompanionService;
pub use prompts::PromptRenderer;
