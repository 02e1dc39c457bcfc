//! Configuration service implementation.
//!
//! Loads `config.toml` (creating it with defaults on first run) and the
//! Gemini API key from `secret.json` or the environment.

use std::fs;

use hearth_core::config::{GeminiSecret, HearthConfig, SecretConfig};
use hearth_core::error::Result;
use tracing::{debug, info};

use crate::paths::HearthPaths;
use crate::storage::{AtomicFile, FileFormat};

/// Environment variable that overrides the key in `secret.json`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: HearthPaths,
}

impl ConfigService {
    pub fn new(paths: HearthPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &HearthPaths {
        &self.paths
    }

    /// Loads `config.toml`, writing the defaults out if the file is missing.
    pub fn load_config(&self) -> Result<HearthConfig> {
        let file = AtomicFile::<HearthConfig>::new(self.paths.config_file(), FileFormat::Toml);
        match file.load()? {
            Some(config) => {
                debug!(path = %file.path().display(), "Loaded configuration");
                Ok(config)
            }
            None => {
                let config = HearthConfig::default();
                file.save(&config)?;
                info!(path = %file.path().display(), "Wrote default configuration");
                Ok(config)
            }
        }
    }

    /// Loads `secret.json` and applies the `GEMINI_API_KEY` override.
    ///
    /// A missing file yields an empty configuration.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        let path = self.paths.secret_file();
        let secrets = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            SecretConfig::default()
        };
        Ok(apply_env_override(secrets, std::env::var(API_KEY_ENV).ok()))
    }
}

/// Replaces the Gemini key with `env_key` when it is non-blank.
pub fn apply_env_override(mut secrets: SecretConfig, env_key: Option<String>) -> SecretConfig {
    if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
        secrets.gemini = Some(GeminiSecret { api_key: key });
    }
    secrets
}
