pub mod audio;
pub mod backup_file;
pub mod config_service;
pub mod json_state_repository;
pub mod paths;
pub mod storage;
pub mod uploads;
pub mod zip_archive_writer;

pub use crate::audio::WavFileSink;
pub use crate::config_service::ConfigService;
pub use crate::json_state_repository::JsonStateRepository;
pub use crate::paths::HearthPaths;
pub use crate::zip_archive_writer::ZipArchiveWriter;
