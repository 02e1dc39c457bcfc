//! CompanionSession - single source of truth for one companion session.
//!
//! Every mutation is a structural update: the aggregate is cloned, the change
//! is applied to the clone and the clone replaces the current state only when
//! the change succeeds. The new state is then saved under [`SESSION_KEY`].
//!
//! AI calls run without holding the state lock, so replies are appended in
//! completion order.

use std::path::PathBuf;
use std::sync::Arc;

use hearth_core::ai::{
    AiRequest, CompanionService, ConversationContext, HISTORY_WINDOW, ImageRequest,
    JournalRequest, ReflectionRequest, SpeechRequest,
};
use hearth_core::audio::{AudioSink, PlaybackController};
use hearth_core::error::{HearthError, Result};
use hearth_core::export::{ArchiveWriter, FULL_ARCHIVE_NAME, full_archive_entries};
use hearth_core::gallery::{GalleryIndex, GallerySelection, GalleryTab, export_selected};
use hearth_core::memory::{JournalEntry, MIN_REFLECTION_MESSAGES, MemoryEntry, filter_new_suggestions};
use hearth_core::message::markup::strip_emphasis;
use hearth_core::message::{ImageAttachment, Message};
use hearth_core::state::{
    AppState, CompanionSettings, GeoLocation, InterfaceSettings, SESSION_KEY, StateRepository,
    TtsConfig, parse_backup, to_backup_json,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::generation::GenerationFlag;
use super::input::UserInput;

const IMAGE_REPLY_FALLBACK: &str = "Here's the photo you asked for.";

/// External collaborators a session talks to.
pub struct SessionCollaborators {
    pub ai: Arc<dyn CompanionService>,
    pub repository: Arc<dyn StateRepository>,
    pub audio_sink: Arc<dyn AudioSink>,
    pub archive_writer: Arc<dyn ArchiveWriter>,
}

/// Routes user intents to state mutations and AI requests.
///
/// Only one generation (chat reply, image, regeneration, reflection or
/// journal entry) runs at a time; a second one fails with
/// `HearthError::Busy` instead of queueing. The in-flight flag is reset on
/// every exit path, including failures.
pub struct CompanionSession {
    state: RwLock<AppState>,
    ai: Arc<dyn CompanionService>,
    repository: Arc<dyn StateRepository>,
    archive_writer: Arc<dyn ArchiveWriter>,
    playback: PlaybackController,
    generating: GenerationFlag,
    selection: Mutex<GallerySelection>,
}

impl CompanionSession {
    /// Creates a session with a fresh aggregate.
    pub fn new(collaborators: SessionCollaborators) -> Self {
        Self::with_state(collaborators, AppState::new())
    }

    pub fn with_state(collaborators: SessionCollaborators, state: AppState) -> Self {
        Self {
            state: RwLock::new(state),
            ai: collaborators.ai,
            repository: collaborators.repository,
            archive_writer: collaborators.archive_writer,
            playback: PlaybackController::new(collaborators.audio_sink),
            generating: GenerationFlag::default(),
            selection: Mutex::new(GallerySelection::new()),
        }
    }

    /// Replaces the in-memory aggregate with the one saved under [`SESSION_KEY`].
    ///
    /// # Returns
    ///
    /// `true` if a saved session was found.
    pub async fn restore(&self) -> Result<bool> {
        match self.repository.load(SESSION_KEY).await? {
            Some(saved) => {
                info!(
                    messages = saved.chat_history.len(),
                    memories = saved.memories.len(),
                    "Restored companion session"
                );
                *self.state.write().await = saved;
                self.selection.lock().await.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// A copy of the current aggregate.
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.chat_history.messages().to_vec()
    }

    /// Whether an AI generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.generating.is_active()
    }

    // ------------------------------------------------------------------
    // Conversation
    // ------------------------------------------------------------------

    /// Appends the user's message and asks the companion to answer it.
    ///
    /// The user message stays in the history even if the AI call fails.
    ///
    /// # Returns
    ///
    /// The AI reply that was appended.
    ///
    /// # Errors
    ///
    /// - `HearthError::Busy` while another generation runs
    /// - `HearthError::Validation` for empty or malformed input
    /// - `HearthError::Request` when the AI call fails
    pub async fn send_message(&self, input: UserInput) -> Result<Message> {
        let _guard = self.generating.try_begin()?;
        let message = input.into_message()?;

        self.update(|state| state.chat_history.append(message.clone()))
            .await?;
        debug!(message_id = %message.id, ooc = message.ooc, "User message appended");

        self.respond_to(message).await
    }

    /// Asks the companion to answer the most recent user message.
    ///
    /// # Errors
    ///
    /// `HearthError::Validation` when the history does not end with a user
    /// message. On failure nothing is appended.
    pub async fn trigger_ai_response(&self) -> Result<Message> {
        let _guard = self.generating.try_begin()?;
        let latest = self
            .state
            .read()
            .await
            .chat_history
            .last()
            .filter(|m| m.is_user())
            .cloned()
            .ok_or_else(|| HearthError::validation("there is no user message to answer"))?;

        self.respond_to(latest).await
    }

    /// Requests a new answer for the AI message `id` and rewrites it in place.
    ///
    /// # Errors
    ///
    /// - `HearthError::NotFound` if the message does not exist
    /// - `HearthError::Validation` if the message is not regeneratable
    pub async fn regenerate(&self, id: &str) -> Result<Message> {
        let _guard = self.generating.try_begin()?;

        let (state, index) = {
            let state = self.state.read().await;
            let index = state
                .chat_history
                .position(id)
                .ok_or_else(|| HearthError::not_found("message", id))?;
            if !state.chat_history.is_regeneratable(index) {
                return Err(HearthError::validation(format!(
                    "message '{}' cannot be regenerated",
                    id
                )));
            }
            (state.clone(), index)
        };

        let messages = state.chat_history.messages();
        let prompt = messages[index - 1].clone();
        let context = conversation_context(&state, history_before(messages, index - 1), prompt);
        let ooc = context.latest.ooc;

        let reply = self.ai.respond(AiRequest::Chat(context)).await?.into_text()?;
        let message = Message::ai(reply.text)
            .with_ooc(ooc)
            .with_grounding(reply.grounding)
            .with_link(reply.link)
            .with_model_url(reply.model_url);

        self.update(|state| state.chat_history.replace_reply(id, message.clone()))
            .await?;
        info!(message_id = id, "Regenerated reply");

        Ok(Message {
            id: id.to_string(),
            ..message
        })
    }

    async fn respond_to(&self, latest: Message) -> Result<Message> {
        let state = self.snapshot().await;

        let reply = match latest.image_directive_prompt() {
            Some(prompt) => {
                let request = ImageRequest {
                    prompt: prompt.to_string(),
                    appearance: state.companion_settings.appearance.clone(),
                    art_style: state.companion_settings.art_style,
                    reference_image: state.companion_settings.reference_image.clone(),
                };
                let image = self.ai.respond(AiRequest::Image(request)).await?.into_image()?;
                let caption = image
                    .caption
                    .clone()
                    .unwrap_or_else(|| IMAGE_REPLY_FALLBACK.to_string());
                Message::ai(caption).with_image(ImageAttachment::new(image.data_uri(), prompt))
            }
            None => {
                let index = state
                    .chat_history
                    .position(&latest.id)
                    .unwrap_or(state.chat_history.len());
                let history = history_before(state.chat_history.messages(), index);
                let context = conversation_context(&state, history, latest.clone());
                let reply = self.ai.respond(AiRequest::Chat(context)).await?.into_text()?;
                Message::ai(reply.text)
                    .with_grounding(reply.grounding)
                    .with_link(reply.link)
                    .with_model_url(reply.model_url)
            }
        }
        .with_ooc(latest.ooc);

        self.update(|state| state.chat_history.append(reply.clone()))
            .await?;
        info!(
            message_id = %reply.id,
            has_image = reply.image.is_some(),
            grounding = reply.grounding.as_ref().map_or(0, Vec::len),
            "AI reply appended"
        );
        Ok(reply)
    }

    /// Replaces the text of a message. Returns whether anything changed.
    pub async fn edit_message(&self, id: &str, text: &str) -> Result<bool> {
        self.update(|state| state.chat_history.edit_text(id, text))
            .await
    }

    /// Replaces the tags on a message's image. Returns the stored tags.
    pub async fn update_image_tags(&self, id: &str, tags: Vec<String>) -> Result<Vec<String>> {
        self.update(|state| state.chat_history.update_image_tags(id, tags))
            .await
    }

    /// Removes every message and clears the gallery selection.
    pub async fn clear_history(&self) -> Result<()> {
        self.playback.stop();
        self.update(|state| {
            state.chat_history.clear();
            Ok(())
        })
        .await?;
        self.selection.lock().await.clear();
        info!("Chat history cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Memories & journal
    // ------------------------------------------------------------------

    pub async fn memories(&self) -> Vec<MemoryEntry> {
        self.state.read().await.memories.clone()
    }

    pub async fn add_memory(&self, content: &str) -> Result<MemoryEntry> {
        self.update(|state| state.add_memory(content)).await
    }

    pub async fn update_memory(&self, id: &str, content: &str) -> Result<()> {
        self.update(|state| state.update_memory(id, content)).await
    }

    pub async fn delete_memory(&self, id: &str) -> Result<MemoryEntry> {
        self.update(|state| state.delete_memory(id)).await
    }

    /// Asks the companion which facts from the conversation are worth remembering.
    ///
    /// Suggestions are returned, not stored; accept them with [`Self::add_memory`].
    ///
    /// # Errors
    ///
    /// `HearthError::Validation` with fewer than [`MIN_REFLECTION_MESSAGES`]
    /// messages in the history.
    pub async fn reflect(&self) -> Result<Vec<String>> {
        let _guard = self.generating.try_begin()?;
        let state = self.snapshot().await;

        if state.chat_history.len() < MIN_REFLECTION_MESSAGES {
            return Err(HearthError::validation(format!(
                "chat a little more first: reflection needs at least {} messages",
                MIN_REFLECTION_MESSAGES
            )));
        }

        let request = ReflectionRequest {
            companion: state.companion_settings.clone(),
            memories: state.memory_texts(),
            history: state.chat_history.recent(HISTORY_WINDOW).to_vec(),
        };
        let suggestions = self
            .ai
            .respond(AiRequest::Reflection(request))
            .await?
            .into_memory_suggestions()?;

        let current = self.state.read().await;
        let fresh = filter_new_suggestions(&current.memories, suggestions);
        debug!(count = fresh.len(), "Memory suggestions ready");
        Ok(fresh)
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.read().await.journal.clone()
    }

    /// Has the companion write a journal entry about the recent conversation.
    ///
    /// The entry is stored at the front of the journal.
    pub async fn generate_journal_entry(&self) -> Result<JournalEntry> {
        let _guard = self.generating.try_begin()?;
        let state = self.snapshot().await;

        if state.chat_history.is_empty() {
            return Err(HearthError::validation(
                "there is no conversation to write about yet",
            ));
        }

        let request = JournalRequest {
            companion: state.companion_settings.clone(),
            memories: state.memory_texts(),
            previous_entries: state.journal.iter().map(|j| j.content.clone()).collect(),
            history: state.chat_history.recent(HISTORY_WINDOW).to_vec(),
        };
        let text = self
            .ai
            .respond(AiRequest::Journal(request))
            .await?
            .into_journal_text()?;

        let entry = JournalEntry::new(&text)?;
        self.update(|state| {
            state.push_journal_entry(entry.clone());
            Ok(())
        })
        .await?;
        info!(entry_id = %entry.id, "Journal entry written");
        Ok(entry)
    }

    pub async fn update_journal_entry(&self, id: &str, content: &str) -> Result<()> {
        self.update(|state| state.update_journal_entry(id, content))
            .await
    }

    // ------------------------------------------------------------------
    // Speech
    // ------------------------------------------------------------------

    /// Speaks an AI message, stopping whatever was playing.
    ///
    /// # Returns
    ///
    /// `false` without contacting the AI when speech is disabled, the message
    /// is from the user, is out of character or has nothing to say.
    ///
    /// # Errors
    ///
    /// - `HearthError::NotFound` if the message does not exist
    /// - `HearthError::Request` if synthesis fails
    /// - `HearthError::Playback` if the audio cannot be decoded or started
    pub async fn play_message_audio(&self, id: &str) -> Result<bool> {
        let (tts, text) = {
            let state = self.state.read().await;
            let message = state
                .chat_history
                .get(id)
                .ok_or_else(|| HearthError::not_found("message", id))?;
            if !message.is_ai() || message.ooc {
                return Ok(false);
            }
            (state.tts_config, strip_emphasis(&message.text))
        };

        if !tts.enabled || text.trim().is_empty() {
            return Ok(false);
        }

        let request = SpeechRequest {
            text: text.trim().to_string(),
            voice: tts.gender,
        };
        let speech = self
            .ai
            .respond(AiRequest::Speech(request))
            .await?
            .into_speech()?;

        let duration = self
            .playback
            .play_base64(speech.pcm_base64, speech.sample_rate, speech.channels)
            .await?;
        debug!(message_id = id, duration_ms = duration.as_millis() as u64, "Speaking message");
        Ok(true)
    }

    /// Stops the current clip. Returns whether one was playing.
    pub fn stop_audio(&self) -> bool {
        self.playback.stop()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub async fn update_companion_settings(&self, settings: CompanionSettings) -> Result<()> {
        if settings.name.trim().is_empty() {
            return Err(HearthError::validation("companion name must not be empty"));
        }
        self.update(|state| {
            state.companion_settings = settings;
            Ok(())
        })
        .await
    }

    /// Updates speech settings. Disabling speech stops the current clip.
    pub async fn set_tts_config(&self, config: TtsConfig) -> Result<()> {
        if !config.enabled {
            self.playback.stop();
        }
        self.update(|state| {
            state.tts_config = config;
            Ok(())
        })
        .await
    }

    pub async fn set_interface_settings(&self, settings: InterfaceSettings) -> Result<()> {
        self.update(|state| {
            state.interface_settings = settings;
            Ok(())
        })
        .await
    }

    /// Shares (or forgets) the user's location for place-aware replies.
    pub async fn set_user_location(&self, location: Option<GeoLocation>) -> Result<()> {
        self.update(|state| {
            state.user_location = location;
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Backup & export
    // ------------------------------------------------------------------

    /// Serializes the aggregate as a backup document.
    pub async fn export_backup(&self) -> Result<String> {
        to_backup_json(&*self.state.read().await)
    }

    /// Replaces the aggregate with a backup document.
    ///
    /// # Errors
    ///
    /// `HearthError::Import` if the document is not a valid backup; the
    /// current state is left untouched.
    pub async fn import_backup(&self, json: &str) -> Result<()> {
        self.import_state(parse_backup(json)?).await
    }

    /// Replaces the aggregate with an already validated backup.
    pub async fn import_state(&self, imported: AppState) -> Result<()> {
        let messages = imported.chat_history.len();

        self.playback.stop();
        self.update(|state| {
            *state = imported;
            Ok(())
        })
        .await?;
        self.selection.lock().await.clear();
        info!(messages, "Backup imported");
        Ok(())
    }

    /// Writes the full data archive (backup, readme and every image).
    pub async fn export_all(&self) -> Result<PathBuf> {
        let entries = full_archive_entries(&*self.state.read().await)?;
        let path = self
            .archive_writer
            .write_archive(FULL_ARCHIVE_NAME, entries)
            .await?;
        info!(path = %path.display(), "Exported all data");
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Gallery
    // ------------------------------------------------------------------

    /// Generated and uploaded image views derived from the current history.
    pub async fn gallery(&self) -> GalleryIndex {
        GalleryIndex::build(self.state.read().await.chat_history.messages())
    }

    /// Toggles the image of message `id` in the export selection.
    ///
    /// Returns whether it is now selected.
    pub async fn toggle_gallery_selection(&self, id: &str) -> Result<bool> {
        if self.gallery().await.find(id).is_none() {
            return Err(HearthError::not_found("gallery image", id));
        }
        Ok(self.selection.lock().await.toggle(id))
    }

    /// Selects every image visible in `tab` under the tag `filter`.
    pub async fn select_all_visible(&self, tab: GalleryTab, filter: Option<&str>) -> usize {
        let index = self.gallery().await;
        let visible = index.view(tab, filter);
        let count = visible.len();
        self.selection.lock().await.select_all(visible);
        count
    }

    pub async fn clear_gallery_selection(&self) {
        self.selection.lock().await.clear();
    }

    pub async fn gallery_selection(&self) -> Vec<String> {
        self.selection
            .lock()
            .await
            .ids()
            .map(str::to_string)
            .collect()
    }

    /// Bundles the selected images into one archive and clears the selection.
    pub async fn export_selected_images(&self) -> Result<PathBuf> {
        let index = self.gallery().await;
        let mut selection = self.selection.lock().await;
        export_selected(&index, &mut selection, self.archive_writer.as_ref()).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Applies `change` to a copy of the aggregate and swaps it in on success.
    async fn update<T>(&self, change: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let value = change(&mut next)?;
        *state = next;
        self.persist(&state).await;
        Ok(value)
    }

    async fn persist(&self, state: &AppState) {
        if let Err(err) = self.repository.save(SESSION_KEY, state).await {
            warn!(error = %err, "Failed to save companion session");
        }
    }
}

/// Up to [`HISTORY_WINDOW`] messages preceding `index`.
fn history_before(messages: &[Message], index: usize) -> Vec<Message> {
    let end = index.min(messages.len());
    messages[end.saturating_sub(HISTORY_WINDOW)..end].to_vec()
}

fn conversation_context(state: &AppState, history: Vec<Message>, latest: Message) -> ConversationContext {
    ConversationContext {
        companion: state.companion_settings.clone(),
        memories: state.memory_texts(),
        history,
        latest,
        location: state.user_location,
    }
}
