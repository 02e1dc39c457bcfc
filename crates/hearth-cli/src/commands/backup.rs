use anyhow::{Context, Result};
use colored::Colorize;
use hearth_infrastructure::backup_file::{read_backup, write_backup};

use crate::BackupAction;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, action: BackupAction) -> Result<()> {
    match action {
        BackupAction::Export { path } => {
            write_backup(&path, &ctx.session.snapshot().await)
                .await
                .with_context(|| format!("Failed to write backup to {}", path.display()))?;
            println!("{}", format!("Backup written to {}", path.display()).green());
        }
        BackupAction::Import { path } => {
            let state = read_backup(&path)
                .await
                .with_context(|| format!("Failed to import {}", path.display()))?;
            let messages = state.chat_history.len();
            ctx.session.import_state(state).await?;
            println!(
                "{}",
                format!("Imported {} messages from {}", messages, path.display()).green()
            );
        }
    }
    Ok(())
}
