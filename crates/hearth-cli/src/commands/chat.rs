//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use hearth_application::UserInput;
use hearth_core::gallery::GalleryTab;
use hearth_core::message::IMAGE_DIRECTIVE;
use hearth_core::message::ooc::is_ooc_indicator;
use hearth_core::state::{GeoLocation, TtsConfig, VoiceGender};
use hearth_infrastructure::uploads::{read_image_upload, read_text_upload};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use super::display::{print_error, print_gallery_item, print_journal_entry, print_memory, print_message};
use crate::context::AppContext;

const COMMANDS: &[(&str, &str)] = &[
    ("/photo", "<prompt>          ask for a photo"),
    ("/image", "<path> [text]     send a picture"),
    ("/file", "<path> [text]      send a text file"),
    ("/edit", "<id> <text>        edit a message"),
    ("/regen", "<id>              regenerate a reply"),
    ("/speak", "<id>              read a reply aloud"),
    ("/stop", "                   stop speaking"),
    ("/tts", "on|off [male|female]"),
    ("/memories", "               list memories"),
    ("/remember", "<text>         add a memory"),
    ("/forget", "<id>             delete a memory"),
    ("/reflect", "                suggest memories from the chat"),
    ("/journal", "                write a journal entry"),
    ("/gallery", "[tag]           list generated images"),
    ("/tags", "<id> <tag..>       tag an image"),
    ("/location", "<lat> <lon>|off share your location"),
    ("/history", "                show the conversation"),
    ("/clear", "                  clear the conversation"),
    ("/help", "                   show this help"),
    ("/quit", "                   leave"),
];

/// Completion, highlighting and hints for slash commands and OOC input.
struct ChatHelper {
    commands: Vec<String>,
}

impl ChatHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else if is_ooc_indicator(line) {
            // Out-of-character input is shown dimmed while typing.
            Owned(line.bright_black().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

enum Flow {
    Continue,
    Quit,
}

pub async fn run(ctx: &AppContext) -> Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper::new()));

    let state = ctx.session.snapshot().await;
    let name = state.companion_settings.name.clone();

    println!("{}", format!("=== {} ===", name).bright_magenta().bold());
    println!(
        "{}",
        "Type to chat, wrap text in (parentheses) to talk out of character, /help for commands."
            .bright_black()
    );
    for message in state.chat_history.recent(10) {
        print_message(message, &name);
    }
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                let flow = if trimmed.starts_with('/') {
                    handle_command(ctx, trimmed).await
                } else {
                    send(ctx, UserInput::text(trimmed)).await;
                    Flow::Continue
                };
                if matches!(flow, Flow::Quit) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    ctx.session.stop_audio();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn companion_name(ctx: &AppContext) -> String {
    ctx.session.snapshot().await.companion_settings.name
}

async fn send(ctx: &AppContext, input: UserInput) {
    println!("{}", "...".bright_black());
    match ctx.session.send_message(input).await {
        Ok(reply) => {
            print_message(&reply, &companion_name(ctx).await);
            speak_if_enabled(ctx, &reply.id).await;
        }
        Err(err) => print_error(&err),
    }
}

async fn speak_if_enabled(ctx: &AppContext, id: &str) {
    match ctx.session.play_message_audio(id).await {
        Ok(true) => {
            if let Some(clip) = ctx.audio.last_clip() {
                println!("{}", format!("    [audio] {}", clip.display()).bright_black());
            }
        }
        Ok(false) => {}
        Err(err) => print_error(&err),
    }
}

async fn handle_command(ctx: &AppContext, line: &str) -> Flow {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));

    match command {
        "/quit" | "/exit" => return Flow::Quit,
        "/help" => {
            for (name, help) in COMMANDS {
                println!("  {} {}", name.bright_cyan(), help.bright_black());
            }
        }
        "/photo" => {
            send(ctx, UserInput::text(format!("{} {}", IMAGE_DIRECTIVE, rest))).await;
        }
        "/image" | "/file" => {
            let (path, text) = rest.split_once(' ').unwrap_or((rest, ""));
            if path.is_empty() {
                println!("{}", format!("Usage: {} <path> [text]", command).yellow());
                return Flow::Continue;
            }
            let path = Path::new(path);
            let input = if command == "/image" {
                read_image_upload(path)
                    .await
                    .map(|uri| UserInput::text(text).with_image(uri))
            } else {
                read_text_upload(path)
                    .await
                    .map(|file| UserInput::text(text).with_file(file.name, file.content))
            };
            match input {
                Ok(input) => send(ctx, input).await,
                Err(err) => print_error(&err),
            }
        }
        "/edit" => match rest.split_once(' ') {
            Some((id, text)) => match ctx.session.edit_message(id, text).await {
                Ok(true) => println!("{}", "Message updated.".bright_black()),
                Ok(false) => println!("{}", "Nothing changed.".bright_black()),
                Err(err) => print_error(&err),
            },
            None => println!("{}", "Usage: /edit <id> <text>".yellow()),
        },
        "/regen" => {
            println!("{}", "...".bright_black());
            match ctx.session.regenerate(rest).await {
                Ok(reply) => print_message(&reply, &companion_name(ctx).await),
                Err(err) => print_error(&err),
            }
        }
        "/speak" => match ctx.session.play_message_audio(rest).await {
            Ok(true) => {
                if let Some(clip) = ctx.audio.last_clip() {
                    println!("{}", format!("[audio] {}", clip.display()).bright_black());
                }
            }
            Ok(false) => println!(
                "{}",
                "Nothing to speak (speech off, your own message, or out of character).".yellow()
            ),
            Err(err) => print_error(&err),
        },
        "/stop" => {
            if !ctx.session.stop_audio() {
                println!("{}", "Nothing is playing.".bright_black());
            }
        }
        "/tts" => {
            let mut args = rest.split_whitespace();
            let enabled = match args.next() {
                Some("on") => true,
                Some("off") => false,
                _ => {
                    println!("{}", "Usage: /tts on|off [male|female]".yellow());
                    return Flow::Continue;
                }
            };
            let gender = match args.next() {
                Some("male") => VoiceGender::Male,
                Some("female") => VoiceGender::Female,
                _ => ctx.session.snapshot().await.tts_config.gender,
            };
            match ctx.session.set_tts_config(TtsConfig { enabled, gender }).await {
                Ok(()) => println!(
                    "{}",
                    format!("Speech {} ({})", if enabled { "on" } else { "off" }, gender.voice_name())
                        .bright_black()
                ),
                Err(err) => print_error(&err),
            }
        }
        "/memories" => {
            let memories = ctx.session.memories().await;
            if memories.is_empty() {
                println!("{}", "No memories yet.".bright_black());
            }
            memories.iter().for_each(print_memory);
        }
        "/remember" => match ctx.session.add_memory(rest).await {
            Ok(memory) => print_memory(&memory),
            Err(err) => print_error(&err),
        },
        "/forget" => match ctx.session.delete_memory(rest).await {
            Ok(memory) => println!("{}", format!("Forgot: {}", memory.content).bright_black()),
            Err(err) => print_error(&err),
        },
        "/reflect" => {
            println!("{}", "...".bright_black());
            match ctx.session.reflect().await {
                Ok(suggestions) if suggestions.is_empty() => {
                    println!("{}", "Nothing new to remember.".bright_black());
                }
                Ok(suggestions) => {
                    for suggestion in suggestions {
                        match ctx.session.add_memory(&suggestion).await {
                            Ok(memory) => print_memory(&memory),
                            Err(err) => print_error(&err),
                        }
                    }
                }
                Err(err) => print_error(&err),
            }
        }
        "/journal" => {
            println!("{}", "...".bright_black());
            match ctx.session.generate_journal_entry().await {
                Ok(entry) => print_journal_entry(&entry),
                Err(err) => print_error(&err),
            }
        }
        "/gallery" => {
            let index = ctx.session.gallery().await;
            let filter = Some(rest).filter(|tag| !tag.is_empty());
            let items = index.view(GalleryTab::Generated, filter);
            if items.is_empty() {
                println!("{}", "No images.".bright_black());
            }
            items.into_iter().for_each(print_gallery_item);
        }
        "/tags" => {
            let mut args = rest.split_whitespace();
            match args.next() {
                Some(id) => {
                    let tags = args.map(str::to_string).collect();
                    match ctx.session.update_image_tags(id, tags).await {
                        Ok(tags) => println!("{}", format!("Tags: {}", tags.join(", ")).bright_black()),
                        Err(err) => print_error(&err),
                    }
                }
                None => println!("{}", "Usage: /tags <id> <tag..>".yellow()),
            }
        }
        "/location" => {
            let location = if rest == "off" {
                None
            } else {
                let coords: Vec<f64> = rest
                    .split_whitespace()
                    .filter_map(|v| v.parse().ok())
                    .collect();
                match coords.as_slice() {
                    [latitude, longitude] => Some(GeoLocation {
                        latitude: *latitude,
                        longitude: *longitude,
                    }),
                    _ => {
                        println!("{}", "Usage: /location <lat> <lon> | off".yellow());
                        return Flow::Continue;
                    }
                }
            };
            if let Err(err) = ctx.session.set_user_location(location).await {
                print_error(&err);
            }
        }
        "/history" => {
            let name = companion_name(ctx).await;
            for message in ctx.session.messages().await {
                print_message(&message, &name);
            }
        }
        "/clear" => match ctx.session.clear_history().await {
            Ok(()) => println!("{}", "Conversation cleared.".bright_black()),
            Err(err) => print_error(&err),
        },
        _ => println!("{}", format!("Unknown command {}. Try /help.", command).yellow()),
    }

    Flow::Continue
}
