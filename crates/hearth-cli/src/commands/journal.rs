use anyhow::Result;
use colored::Colorize;

use super::display::print_journal_entry;
use crate::JournalAction;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, action: JournalAction) -> Result<()> {
    match action {
        JournalAction::List => {
            let journal = ctx.session.journal().await;
            if journal.is_empty() {
                println!("{}", "The journal is empty.".bright_black());
            }
            journal.iter().for_each(print_journal_entry);
        }
        JournalAction::New => {
            let entry = ctx.session.generate_journal_entry().await?;
            print_journal_entry(&entry);
        }
    }
    Ok(())
}
