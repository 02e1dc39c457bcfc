//! Unified path management for hearth configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/hearth/            # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//!
//! ~/.local/share/hearth/       # Data directory
//! ├── state/                   # Session aggregate (one JSON document per key)
//! ├── audio/                   # Rendered speech clips
//! └── exports/                 # Gallery and full-data archives
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use hearth_core::config::{GeminiSecret, HearthConfig, SecretConfig};
use hearth_core::error::{HearthError, Result};
use tracing::info;

const APP_DIR: &str = "hearth";

/// Resolved locations of every file hearth reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HearthPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    audio_dir: Option<PathBuf>,
}

impl HearthPaths {
    /// Uses the platform config and data directories.
    ///
    /// # Errors
    ///
    /// `HearthError::Config` when the home directory cannot be determined.
    pub fn from_system() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HearthError::config("cannot determine the config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| HearthError::config("cannot determine the data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
            audio_dir: None,
        })
    }

    /// Places config and data under a single root (`<root>/config`, `<root>/data`).
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            audio_dir: None,
        }
    }

    /// Applies the `[storage]` and `[audio]` overrides from the configuration.
    pub fn apply_config(mut self, config: &HearthConfig) -> Self {
        if let Some(data_dir) = &config.storage.data_dir {
            self.data_dir = data_dir.clone();
        }
        self.audio_dir = config.audio.output_dir.clone();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.audio_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("audio"))
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    /// Creates `secret.json` with an empty key template if it does not exist.
    ///
    /// On Unix the file is restricted to the owner (mode 600).
    ///
    /// # Returns
    ///
    /// `true` if the template was written.
    pub fn ensure_secret_file(&self) -> Result<bool> {
        let path = self.secret_file();
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.config_dir)?;

        let template = SecretConfig {
            gemini: Some(GeminiSecret {
                api_key: String::new(),
            }),
        };
        fs::write(&path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %path.display(), "Created secret file template");
        Ok(true)
    }
}
