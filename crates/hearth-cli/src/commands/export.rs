use anyhow::Result;
use colored::Colorize;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let path = ctx.session.export_all().await?;
    println!("{}", format!("Exported everything to {}", path.display()).green());
    Ok(())
}
