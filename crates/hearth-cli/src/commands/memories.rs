use anyhow::Result;
use colored::Colorize;

use super::display::print_memory;
use crate::MemoriesAction;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, action: MemoriesAction) -> Result<()> {
    match action {
        MemoriesAction::List => {
            let memories = ctx.session.memories().await;
            if memories.is_empty() {
                println!("{}", "No memories yet.".bright_black());
            }
            memories.iter().for_each(print_memory);
        }
        MemoriesAction::Add { content } => {
            let memory = ctx.session.add_memory(&content).await?;
            print_memory(&memory);
        }
        MemoriesAction::Update { id, content } => {
            ctx.session.update_memory(&id, &content).await?;
            println!("{}", "Memory updated.".bright_black());
        }
        MemoriesAction::Delete { id } => {
            let memory = ctx.session.delete_memory(&id).await?;
            println!("{}", format!("Forgot: {}", memory.content).bright_black());
        }
    }
    Ok(())
}
