//! Companion, interface and speech preferences.

use serde::{Deserialize, Serialize};

/// Rendering style for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtStyle {
    #[default]
    Photorealistic,
    Anime,
}

impl ArtStyle {
    /// Phrase appended to image prompts.
    pub fn prompt_phrase(self) -> &'static str {
        match self {
            ArtStyle::Photorealistic => "photorealistic, natural lighting, detailed",
            ArtStyle::Anime => "anime style illustration, clean line art, vibrant colors",
        }
    }
}

/// Identity of the simulated companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanionSettings {
    pub name: String,
    /// Free-text personality description used as the system persona
    pub persona: String,
    /// Physical description used when generating images of the companion
    pub appearance: String,
    pub art_style: ArtStyle,
    /// Optional base64 data URI used as a visual reference for image generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl Default for CompanionSettings {
    fn default() -> Self {
        Self {
            name: "Aria".to_string(),
            persona: "A warm, curious and playful friend who remembers the little things \
                      and enjoys long conversations."
                .to_string(),
            appearance: "A woman in her late twenties with shoulder-length auburn hair, \
                         green eyes and a relaxed smile."
                .to_string(),
            art_style: ArtStyle::default(),
            reference_image: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterfaceSettings {
    pub ui_sounds: bool,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self { ui_sounds: true }
    }
}

/// Voice gender for speech synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl VoiceGender {
    /// Prebuilt voice name understood by the speech service.
    pub fn voice_name(self) -> &'static str {
        match self {
            VoiceGender::Female => "Kore",
            VoiceGender::Male => "Puck",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsConfig {
    pub enabled: bool,
    pub gender: VoiceGender,
}

/// Last position shared by the user, used to ground place-related answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}
