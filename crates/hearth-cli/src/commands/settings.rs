use anyhow::Result;
use colored::Colorize;
use hearth_core::state::{ArtStyle, TtsConfig, VoiceGender};

use crate::context::AppContext;
use crate::{ArtStyleArg, SettingsAction, VoiceArg};

pub async fn run(ctx: &AppContext, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => print_settings(ctx).await,
        SettingsAction::Companion {
            name,
            persona,
            appearance,
            art_style,
        } => {
            let mut settings = ctx.session.snapshot().await.companion_settings;
            if let Some(name) = name {
                settings.name = name.trim().to_string();
            }
            if let Some(persona) = persona {
                settings.persona = persona;
            }
            if let Some(appearance) = appearance {
                settings.appearance = appearance;
            }
            if let Some(style) = art_style {
                settings.art_style = match style {
                    ArtStyleArg::Photorealistic => ArtStyle::Photorealistic,
                    ArtStyleArg::Anime => ArtStyle::Anime,
                };
            }
            ctx.session.update_companion_settings(settings).await?;
            println!("{}", "Companion updated.".bright_black());
        }
        SettingsAction::Interface { ui_sounds } => {
            let mut settings = ctx.session.snapshot().await.interface_settings;
            settings.ui_sounds = ui_sounds;
            ctx.session.set_interface_settings(settings).await?;
            println!("{}", "Interface settings updated.".bright_black());
        }
        SettingsAction::Tts { enabled, voice } => {
            let gender = match voice {
                VoiceArg::Female => VoiceGender::Female,
                VoiceArg::Male => VoiceGender::Male,
            };
            ctx.session.set_tts_config(TtsConfig { enabled, gender }).await?;
            println!("{}", "Speech settings updated.".bright_black());
        }
    }
    Ok(())
}

async fn print_settings(ctx: &AppContext) {
    let state = ctx.session.snapshot().await;
    let companion = &state.companion_settings;
    let art_style = match companion.art_style {
        ArtStyle::Photorealistic => "photorealistic",
        ArtStyle::Anime => "anime",
    };

    println!("{}", companion.name.bright_magenta().bold());
    println!("  {} {}", "persona:".bright_black(), companion.persona);
    println!("  {} {}", "appearance:".bright_black(), companion.appearance);
    println!("  {} {}", "art style:".bright_black(), art_style);
    println!(
        "  {} {} ({})",
        "speech:".bright_black(),
        if state.tts_config.enabled { "on" } else { "off" },
        state.tts_config.gender.voice_name()
    );
    println!(
        "  {} {}",
        "ui sounds:".bright_black(),
        if state.interface_settings.ui_sounds { "on" } else { "off" }
    );
    match state.user_location {
        Some(location) => println!(
            "  {} {:.4}, {:.4}",
            "location:".bright_black(),
            location.latitude,
            location.longitude
        ),
        None => println!("  {} {}", "location:".bright_black(), "not shared".bright_black()),
    }
}
