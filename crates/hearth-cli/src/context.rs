//! Wires the session to its collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hearth_application::{CompanionSession, SessionCollaborators};
use hearth_core::ai::{AiReply, AiRequest, CompanionService};
use hearth_core::error::HearthError;
use hearth_infrastructure::{
    ConfigService, HearthPaths, JsonStateRepository, WavFileSink, ZipArchiveWriter,
};
use hearth_interaction::GeminiCompanionService;
use tracing::{info, warn};

/// Stand-in used when no API key is configured.
///
/// Offline commands (memories, gallery, backups) keep working; anything that
/// needs the model reports how to configure the key.
struct OfflineService {
    secret_file: PathBuf,
}

#[async_trait]
impl CompanionService for OfflineService {
    async fn respond(&self, _request: AiRequest) -> hearth_core::Result<AiReply> {
        Err(HearthError::request(format!(
            "no Gemini API key: add it to {} or set GEMINI_API_KEY",
            self.secret_file.display()
        )))
    }
}

pub struct AppContext {
    pub session: CompanionSession,
    pub paths: HearthPaths,
    pub audio: Arc<WavFileSink>,
}

impl AppContext {
    /// Loads configuration, builds the collaborators and restores the saved session.
    ///
    /// `exports_dir` overrides where archives are written.
    pub async fn open(exports_dir: Option<PathBuf>) -> Result<Self> {
        let paths = HearthPaths::from_system().context("Failed to resolve hearth directories")?;
        let config_service = ConfigService::new(paths.clone());
        let config = config_service
            .load_config()
            .context("Failed to load config.toml")?;
        let paths = paths.apply_config(&config);

        if paths.ensure_secret_file()? {
            info!(path = %paths.secret_file().display(), "Add your Gemini API key to the secret file");
        }
        let secrets = config_service
            .load_secrets()
            .context("Failed to load secret.json")?;

        let ai: Arc<dyn CompanionService> =
            match GeminiCompanionService::from_secrets(&secrets, config.gemini.clone()) {
                Ok(service) => Arc::new(service),
                Err(err) => {
                    warn!(error = %err, "AI features are disabled");
                    Arc::new(OfflineService {
                        secret_file: paths.secret_file(),
                    })
                }
            };

        let audio = Arc::new(WavFileSink::new(paths.audio_dir()));
        let archive_dir = exports_dir.unwrap_or_else(|| paths.exports_dir());

        let session = CompanionSession::new(SessionCollaborators {
            ai,
            repository: Arc::new(JsonStateRepository::new(paths.state_dir())),
            audio_sink: audio.clone(),
            archive_writer: Arc::new(ZipArchiveWriter::new(archive_dir)),
        });

        let restored = session.restore().await.with_context(|| {
            format!(
                "Failed to restore the saved session in {}",
                paths.state_dir().display()
            )
        })?;
        if !restored {
            info!("Starting a new companion session");
        }

        Ok(Self {
            session,
            paths,
            audio,
        })
    }
}
