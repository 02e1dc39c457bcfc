use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use context::AppContext;

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Hearth - chat with your AI companion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Browse and export images from the conversation
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
    /// Save or restore the whole session as JSON
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Manage what the companion remembers about you
    Memories {
        #[command(subcommand)]
        action: MemoriesAction,
    },
    /// Read or write the companion's journal
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
    /// Show or change companion, interface and speech settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Write a zip archive with the backup and every image
    Export {
        /// Output directory (defaults to the data directory's exports/)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum GalleryAction {
    /// List images, newest first
    List {
        /// Show uploaded images instead of generated ones
        #[arg(long)]
        uploaded: bool,
        /// Only images carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// List every known tag
    Tags,
    /// Replace the tags of an image
    Tag {
        /// Id of the message holding the image
        id: String,
        tags: Vec<String>,
    },
    /// Bundle the given images into one zip archive
    Export {
        #[arg(required_unless_present = "all")]
        ids: Vec<String>,
        /// Also select every image visible in the tab (after --tag)
        #[arg(long)]
        all: bool,
        /// With --all: use the uploaded tab
        #[arg(long)]
        uploaded: bool,
        /// With --all: only images carrying this tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Write the session to a JSON file
    Export { path: PathBuf },
    /// Replace the session with a JSON backup
    Import { path: PathBuf },
}

#[derive(Subcommand)]
pub enum MemoriesAction {
    List,
    Add { content: String },
    Update { id: String, content: String },
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ArtStyleArg {
    Photorealistic,
    Anime,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum VoiceArg {
    Female,
    Male,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,
    /// Change the companion's identity; omitted fields keep their value
    Companion {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        persona: Option<String>,
        #[arg(long)]
        appearance: Option<String>,
        #[arg(long, value_enum)]
        art_style: Option<ArtStyleArg>,
    },
    Interface {
        #[arg(long, action = clap::ArgAction::Set)]
        ui_sounds: bool,
    },
    Tts {
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
        #[arg(long, value_enum, default_value = "female")]
        voice: VoiceArg,
    },
}

#[derive(Subcommand)]
pub enum JournalAction {
    List,
    /// Have the companion write a new entry
    New,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hearth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let ctx = AppContext::open(None).await?;
            commands::chat::run(&ctx).await?
        }
        Commands::Gallery { action } => {
            let dir = match &action {
                GalleryAction::Export { dir, .. } => dir.clone(),
                _ => None,
            };
            let ctx = AppContext::open(dir).await?;
            commands::gallery::run(&ctx, action).await?
        }
        Commands::Backup { action } => {
            let ctx = AppContext::open(None).await?;
            commands::backup::run(&ctx, action).await?
        }
        Commands::Memories { action } => {
            let ctx = AppContext::open(None).await?;
            commands::memories::run(&ctx, action).await?
        }
        Commands::Journal { action } => {
            let ctx = AppContext::open(None).await?;
            commands::journal::run(&ctx, action).await?
        }
        Commands::Settings { action } => {
            let ctx = AppContext::open(None).await?;
            commands::settings::run(&ctx, action).await?
        }
        Commands::Export { dir } => {
            let ctx = AppContext::open(dir).await?;
            commands::export::run(&ctx).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_export_all_needs_no_ids() {
        let cli = Cli::try_parse_from(["hearth", "gallery", "export", "--all", "--tag", "beach"]).unwrap();
        match cli.command {
            Some(Commands::Gallery {
                action: GalleryAction::Export { ids, all, tag, .. },
            }) => {
                assert!(ids.is_empty());
                assert!(all);
                assert_eq!(tag.as_deref(), Some("beach"));
            }
            _ => panic!("expected gallery export"),
        }

        assert!(Cli::try_parse_from(["hearth", "gallery", "export"]).is_err());
    }

    #[test]
    fn test_settings_flags_take_values() {
        let cli = Cli::try_parse_from(["hearth", "settings", "interface", "--ui-sounds", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Settings {
                action: SettingsAction::Interface { ui_sounds: false }
            })
        ));

        let cli = Cli::try_parse_from(["hearth", "settings", "companion", "--art-style", "anime"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Settings {
                action: SettingsAction::Companion {
                    art_style: Some(ArtStyleArg::Anime),
                    ..
                }
            })
        ));
    }
}
