pub mod backup;
pub mod model;
pub mod repository;
pub mod settings;

pub use backup::{parse_backup, to_backup_json, validate_backup};
pub use model::AppState;
pub use repository::{SESSION_KEY, StateRepository};
pub use settings::{ArtStyle, CompanionSettings, GeoLocation, InterfaceSettings, TtsConfig, VoiceGender};
