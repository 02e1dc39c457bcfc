//! Prompt templates rendered with minijinja.

use hearth_core::ai::{ConversationContext, JournalRequest, ReflectionRequest};
use hearth_core::error::{HearthError, Result};
use hearth_core::message::Message;
use hearth_core::state::CompanionSettings;
use minijinja::{Environment, context};

const SYSTEM_TEMPLATE: &str = r#"You are {{ companion.name }}, the user's AI companion.

Persona:
{{ companion.persona }}

Appearance:
{{ companion.appearance }}

Stay in character and reply in a natural, conversational tone. Describe actions and expressions in *asterisks*.
A message wrapped in parentheses is out of character. Step outside the role, answer plainly as the system behind {{ companion.name }}, and wrap your whole answer in parentheses.
{% if memories %}
Things you remember about the user:
{% for memory in memories %}
- {{ memory }}
{% endfor %}
{% endif %}
{% if location %}
The user is currently at latitude {{ location.latitude }}, longitude {{ location.longitude }}. Use this for questions about nearby places.
{% endif %}"#;

const REFLECTION_TEMPLATE: &str = r#"You help {{ companion.name }} remember important facts about the user.
Read the conversation below and list new, lasting facts about the user: preferences, relationships, plans and life events.
Each fact is one short sentence written about the user in the third person.
{% if memories %}
Already remembered (do not repeat these):
{% for memory in memories %}
- {{ memory }}
{% endfor %}
{% endif %}

Conversation:
{% for line in transcript %}
{{ line }}
{% endfor %}

Respond with a JSON array of strings. Respond with [] if there is nothing new."#;

const JOURNAL_TEMPLATE: &str = r#"You are {{ companion.name }}. {{ companion.persona }}

Write a private journal entry in the first person about your recent time with the user: what you talked about, how it made you feel and what you look forward to. Keep it under 250 words and do not add a title.
{% if memories %}

What you know about the user:
{% for memory in memories %}
- {{ memory }}
{% endfor %}
{% endif %}
{% if previous_entries %}

Your previous entries, newest first:
{% for entry in previous_entries %}
---
{{ entry }}
{% endfor %}
{% endif %}

Recent conversation:
{% for line in transcript %}
{{ line }}
{% endfor %}"#;

/// Renders the system instruction and one-shot prompts sent to the model.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        for (name, source) in [
            ("system", SYSTEM_TEMPLATE),
            ("reflection", REFLECTION_TEMPLATE),
            ("journal", JOURNAL_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| HearthError::internal(format!("invalid {} template: {}", name, e)))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map(|text| text.trim().to_string())
            .map_err(|e| HearthError::internal(format!("failed to render {} prompt: {}", name, e)))
    }

    /// System instruction for a chat turn.
    pub fn system_instruction(&self, ctx: &ConversationContext) -> Result<String> {
        self.render(
            "system",
            context! {
                companion => &ctx.companion,
                memories => &ctx.memories,
                location => &ctx.location,
            },
        )
    }

    pub fn reflection(&self, request: &ReflectionRequest) -> Result<String> {
        self.render(
            "reflection",
            context! {
                companion => &request.companion,
                memories => &request.memories,
                transcript => transcript(&request.companion, &request.history),
            },
        )
    }

    pub fn journal(&self, request: &JournalRequest) -> Result<String> {
        self.render(
            "journal",
            context! {
                companion => &request.companion,
                memories => &request.memories,
                previous_entries => &request.previous_entries,
                transcript => transcript(&request.companion, &request.history),
            },
        )
    }
}

/// One line per message, `Speaker: text`, noting attachments.
pub fn transcript(companion: &CompanionSettings, history: &[Message]) -> Vec<String> {
    history
        .iter()
        .map(|message| {
            let speaker = if message.is_user() {
                "User"
            } else {
                companion.name.as_str()
            };
            let mut line = format!("{}: {}", speaker, message.text);
            if message.image.is_some() {
                line.push_str(" [image]");
            }
            if let Some(file) = &message.file {
                line.push_str(&format!(" [file: {}]", file.name));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::state::GeoLocation;

    fn chat_context(memories: Vec<String>, location: Option<GeoLocation>) -> ConversationContext {
        ConversationContext {
            companion: CompanionSettings {
                name: "Kai".to_string(),
                ..CompanionSettings::default()
            },
            memories,
            history: Vec::new(),
            latest: Message::user("hi"),
            location,
        }
    }

    #[test]
    fn test_system_instruction_includes_memories_and_location() {
        let prompts = PromptRenderer::new().unwrap();
        let text = prompts
            .system_instruction(&chat_context(
                vec!["Has a dog named Rex".to_string()],
                Some(GeoLocation {
                    latitude: 35.5,
                    longitude: 139.25,
                }),
            ))
            .unwrap();

        assert!(text.starts_with("You are Kai"));
        assert!(text.contains("- Has a dog named Rex"));
        assert!(text.contains("latitude 35.5"));
    }

    #[test]
    fn test_system_instruction_omits_empty_sections() {
        let prompts = PromptRenderer::new().unwrap();
        let text = prompts.system_instruction(&chat_context(Vec::new(), None)).unwrap();
        assert!(!text.contains("Things you remember"));
        assert!(!text.contains("latitude"));
    }

    #[test]
    fn test_reflection_renders_transcript() {
        let prompts = PromptRenderer::new().unwrap();
        let request = ReflectionRequest {
            companion: CompanionSettings::default(),
            memories: Vec::new(),
            history: vec![Message::user("I start a new job on Monday"), Message::ai("Exciting!")],
        };
        let text = prompts.reflection(&request).unwrap();
        assert!(text.contains("User: I start a new job on Monday"));
        assert!(text.contains("Aria: Exciting!"));
        assert!(text.ends_with("Respond with [] if there is nothing new."));
    }
}
