//! Terminal rendering of messages, gallery items, memories and journal entries.

use colored::Colorize;
use hearth_core::gallery::GalleryItem;
use hearth_core::memory::{JournalEntry, MemoryEntry};
use hearth_core::message::markup::emphasis_spans;
use hearth_core::message::{GroundingKind, Message};

/// Renders `*emphasis*` runs in italics.
fn styled_text(text: &str) -> String {
    emphasis_spans(text)
        .into_iter()
        .map(|span| {
            if span.emphasized {
                span.text.italic().bright_black().to_string()
            } else {
                span.text.to_string()
            }
        })
        .collect()
}

pub fn print_message(message: &Message, companion_name: &str) {
    let speaker = if message.is_user() {
        "You".green().bold()
    } else {
        companion_name.bright_magenta().bold()
    };
    let id = format!("[{}]", message.id).bright_black();

    if message.ooc {
        println!("{} {} {}", id, speaker, message.text.bright_black());
    } else {
        println!("{} {} {}", id, speaker, styled_text(&message.text));
    }

    if let Some(image) = &message.image {
        let tags = image
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "    {} {} {}",
            "[image]".cyan(),
            image.prompt,
            tags.bright_blue()
        );
    }
    if let Some(file) = &message.file {
        println!(
            "    {} {} ({} bytes)",
            "[file]".cyan(),
            file.name,
            file.content.len()
        );
    }
    if let Some(link) = &message.link {
        println!("    {} {} - {}", "[link]".cyan(), link.title, link.url);
    }
    if let Some(model_url) = &message.model_url {
        println!("    {} {}", "[model]".cyan(), model_url);
    }
    if let Some(sources) = &message.grounding {
        println!("    {}", "Sources:".bright_black());
        for source in sources {
            let kind = match source.kind {
                GroundingKind::Web => "web",
                GroundingKind::Maps => "maps",
            };
            println!("      - ({}) {} {}", kind, source.title, source.uri.bright_black());
            for snippet in source.review_snippets() {
                println!("          \"{}\"", snippet.content.italic());
            }
        }
    }
}

pub fn print_gallery_item(item: &GalleryItem) {
    let image = &item.image;
    let tags = if image.tags.is_empty() {
        String::new()
    } else {
        image
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ")
    };
    println!(
        "{}  {}  {}  {}",
        image.timestamp.bright_black(),
        item.message_id.cyan(),
        image.prompt,
        tags.bright_blue()
    );
}

pub fn print_memory(memory: &MemoryEntry) {
    println!(
        "{}  {}  {}",
        memory.date.bright_black(),
        memory.id.cyan(),
        memory.content
    );
}

pub fn print_journal_entry(entry: &JournalEntry) {
    println!("{}  {}", entry.date.bright_magenta().bold(), entry.id.bright_black());
    for line in entry.content.lines() {
        println!("  {}", line);
    }
    println!();
}

pub fn print_error(err: &hearth_core::HearthError) {
    eprintln!("{}", err.user_message().red());
}
