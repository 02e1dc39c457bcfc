pub mod backup;
pub mod chat;
pub mod display;
pub mod export;
pub mod gallery;
pub mod journal;
pub mod memories;
pub mod settings;
