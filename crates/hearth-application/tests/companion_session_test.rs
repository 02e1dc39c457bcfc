use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hearth_application::{CompanionSession, SessionCollaborators, UserInput};
use hearth_core::ai::{AiReply, AiRequest, CompanionService, ImageReply, SpeechReply, TextReply};
use hearth_core::audio::{AudioSink, PcmBuffer, PlaybackHandle};
use hearth_core::error::{HearthError, Result};
use hearth_core::export::{ArchiveEntry, ArchiveWriter};
use hearth_core::gallery::{GALLERY_ARCHIVE_NAME, GalleryTab};
use hearth_core::message::Message;
use hearth_core::state::{
    AppState, ArtStyle, CompanionSettings, InterfaceSettings, SESSION_KEY, StateRepository, TtsConfig,
};
use hearth_infrastructure::JsonStateRepository;
use tokio::sync::Notify;

// ----------------------------------------------------------------------------
// Mock collaborators
// ----------------------------------------------------------------------------

#[derive(Default)]
struct MockService {
    replies: Mutex<VecDeque<Result<AiReply>>>,
    requests: Mutex<Vec<AiRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockService {
    fn with_replies(replies: Vec<Result<AiReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn gated(gate: Arc<Notify>, replies: Vec<Result<AiReply>>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::with_replies(replies)
        }
    }

    fn requests(&self) -> Vec<AiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompanionService for MockService {
    async fn respond(&self, request: AiRequest) -> Result<AiReply> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HearthError::request("no scripted reply")))
    }
}

#[derive(Default)]
struct MemoryRepository {
    saved: Mutex<HashMap<String, AppState>>,
}

#[async_trait]
impl StateRepository for MemoryRepository {
    async fn load(&self, key: &str) -> Result<Option<AppState>> {
        Ok(self.saved.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &str, state: &AppState) -> Result<()> {
        self.saved
            .lock()
            .unwrap()
            .insert(key.to_string(), state.clone());
        Ok(())
    }
}

struct FailingRepository;

#[async_trait]
impl StateRepository for FailingRepository {
    async fn load(&self, _key: &str) -> Result<Option<AppState>> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _state: &AppState) -> Result<()> {
        Err(HearthError::io("read-only file system"))
    }
}

#[derive(Default)]
struct MockSink {
    events: Arc<Mutex<Vec<String>>>,
}

struct MockHandle {
    clip: usize,
    active: bool,
    events: Arc<Mutex<Vec<String>>>,
}

impl PlaybackHandle for MockHandle {
    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.events.lock().unwrap().push(format!("stop:{}", self.clip));
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl AudioSink for MockSink {
    fn start(&self, _buffer: PcmBuffer) -> Result<Box<dyn PlaybackHandle>> {
        let mut events = self.events.lock().unwrap();
        let clip = events.iter().filter(|e| e.starts_with("start")).count() + 1;
        events.push(format!("start:{}", clip));
        Ok(Box::new(MockHandle {
            clip,
            active: true,
            events: self.events.clone(),
        }))
    }
}

#[derive(Default)]
struct MockWriter {
    fail: bool,
    written: Mutex<Vec<(String, Vec<ArchiveEntry>)>>,
}

#[async_trait]
impl ArchiveWriter for MockWriter {
    async fn write_archive(&self, archive_name: &str, entries: Vec<ArchiveEntry>) -> Result<PathBuf> {
        if self.fail {
            return Err(HearthError::io("disk full"));
        }
        self.written
            .lock()
            .unwrap()
            .push((archive_name.to_string(), entries));
        Ok(PathBuf::from(archive_name))
    }
}

struct Harness {
    session: Arc<CompanionSession>,
    service: Arc<MockService>,
    repository: Arc<MemoryRepository>,
    audio_events: Arc<Mutex<Vec<String>>>,
    writer: Arc<MockWriter>,
}

fn harness_with(service: MockService, writer: MockWriter) -> Harness {
    let service = Arc::new(service);
    let repository = Arc::new(MemoryRepository::default());
    let sink = MockSink::default();
    let audio_events = sink.events.clone();
    let writer = Arc::new(writer);

    let session = CompanionSession::new(SessionCollaborators {
        ai: service.clone(),
        repository: repository.clone(),
        audio_sink: Arc::new(sink),
        archive_writer: writer.clone(),
    });

    Harness {
        session: Arc::new(session),
        service,
        repository,
        audio_events,
        writer,
    }
}

fn harness(replies: Vec<Result<AiReply>>) -> Harness {
    harness_with(MockService::with_replies(replies), MockWriter::default())
}

fn text(reply: &str) -> Result<AiReply> {
    Ok(AiReply::Text(TextReply::new(reply)))
}

fn image(data: &str) -> Result<AiReply> {
    Ok(AiReply::Image(ImageReply {
        mime_type: "image/png".to_string(),
        data: data.to_string(),
        caption: None,
    }))
}

// ----------------------------------------------------------------------------
// Conversation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_send_message_appends_user_then_reply() {
    let h = harness(vec![text("*waves* Hello!")]);

    let reply = h.session.send_message(UserInput::text("Hi")).await.unwrap();

    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user());
    assert_eq!(messages[1].id, reply.id);
    assert_eq!(messages[1].text, "*waves* Hello!");
    assert!(!h.session.is_generating());

    let saved = h.repository.load(SESSION_KEY).await.unwrap().unwrap();
    assert_eq!(saved.chat_history.len(), 2);

    match &h.service.requests()[0] {
        AiRequest::Chat(ctx) => {
            assert_eq!(ctx.latest.text, "Hi");
            assert!(ctx.history.is_empty());
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn test_reply_to_ooc_message_is_ooc() {
    let h = harness(vec![text("(I am a language model.)")]);

    let reply = h
        .session
        .send_message(UserInput::text("(what are you really?)"))
        .await
        .unwrap();

    assert!(reply.ooc);
    assert!(h.session.messages().await[0].ooc);
}

#[tokio::test]
async fn test_failed_trigger_resets_flag_and_appends_nothing() {
    let state = AppState {
        chat_history: hearth_core::message::MessageStore::from_messages(vec![Message::user(
            "Are you there?",
        )])
        .unwrap(),
        ..AppState::default()
    };
    let service = Arc::new(MockService::with_replies(vec![Err(HearthError::request(
        "quota exceeded",
    ))]));
    let session = CompanionSession::with_state(
        SessionCollaborators {
            ai: service.clone(),
            repository: Arc::new(MemoryRepository::default()),
            audio_sink: Arc::new(MockSink::default()),
            archive_writer: Arc::new(MockWriter::default()),
        },
        state,
    );

    let err = session.trigger_ai_response().await.unwrap_err();

    assert!(err.is_request());
    assert!(!session.is_generating());
    assert_eq!(session.messages().await.len(), 1);
}

#[tokio::test]
async fn test_failed_send_keeps_user_message_only() {
    let h = harness(vec![Err(HearthError::request("network down"))]);

    let err = h.session.send_message(UserInput::text("Hello?")).await.unwrap_err();

    assert!(err.is_request());
    assert!(!h.session.is_generating());
    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_user());
}

#[tokio::test]
async fn test_second_generation_is_rejected_while_busy() {
    let gate = Arc::new(Notify::new());
    let h = harness_with(
        MockService::gated(gate.clone(), vec![text("first")]),
        MockWriter::default(),
    );

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.send_message(UserInput::text("one")).await });

    while !h.session.is_generating() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let err = h.session.send_message(UserInput::text("two")).await.unwrap_err();
    assert!(err.is_busy());
    assert!(h.session.reflect().await.unwrap_err().is_busy());

    gate.notify_one();
    let reply = first.await.unwrap().unwrap();
    assert_eq!(reply.text, "first");
    assert!(!h.session.is_generating());
    assert_eq!(h.session.messages().await.len(), 2);
}

#[tokio::test]
async fn test_image_directive_routes_to_image_request() {
    let h = harness(vec![image("iVBORw0KGgo=")]);

    let reply = h
        .session
        .send_message(UserInput::text("Generate a photo: you reading by the window"))
        .await
        .unwrap();

    let attachment = reply.image.as_ref().unwrap();
    assert_eq!(attachment.src, "data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(attachment.prompt, "you reading by the window");
    assert!(attachment.tags.is_empty());

    match &h.service.requests()[0] {
        AiRequest::Image(request) => {
            assert_eq!(request.prompt, "you reading by the window");
            assert_eq!(request.appearance, AppState::default().companion_settings.appearance);
        }
        other => panic!("unexpected request: {other:?}"),
    }

    let gallery = h.session.gallery().await;
    assert_eq!(gallery.generated().len(), 1);
    assert!(gallery.uploaded().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_does_not_fail_send() {
    let session = CompanionSession::new(SessionCollaborators {
        ai: Arc::new(MockService::with_replies(vec![text("still here")])),
        repository: Arc::new(FailingRepository),
        audio_sink: Arc::new(MockSink::default()),
        archive_writer: Arc::new(MockWriter::default()),
    });

    session.send_message(UserInput::text("hi")).await.unwrap();
    assert_eq!(session.messages().await.len(), 2);
}

// ----------------------------------------------------------------------------
// Regeneration & edits
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_regenerate_rewrites_in_place() {
    let h = harness(vec![text("first answer"), text("second answer")]);
    let reply = h.session.send_message(UserInput::text("Tell me a joke")).await.unwrap();

    let regenerated = h.session.regenerate(&reply.id).await.unwrap();

    assert_eq!(regenerated.id, reply.id);
    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, reply.id);
    assert_eq!(messages[1].text, "second answer");
    assert!(!h.session.is_generating());
}

#[tokio::test]
async fn test_regenerate_rejects_image_replies_and_user_messages() {
    let h = harness(vec![image("QUJD")]);
    let reply = h
        .session
        .send_message(UserInput::text("generate a photo: a cat"))
        .await
        .unwrap();

    assert!(h.session.regenerate(&reply.id).await.unwrap_err().is_validation());

    let user_id = h.session.messages().await[0].id.clone();
    assert!(h.session.regenerate(&user_id).await.unwrap_err().is_validation());
    assert!(h.session.regenerate("missing").await.unwrap_err().is_not_found());
    assert_eq!(h.service.requests().len(), 1);
}

#[tokio::test]
async fn test_edit_and_tag_updates() {
    let h = harness(vec![image("QUJD")]);
    let reply = h
        .session
        .send_message(UserInput::text("generate a photo: sunset"))
        .await
        .unwrap();

    assert!(h.session.edit_message(&reply.id, "  A sunset for you ").await.unwrap());
    assert!(!h.session.edit_message(&reply.id, "A sunset for you").await.unwrap());

    let tags = h
        .session
        .update_image_tags(&reply.id, vec!["#sky".into(), "sky".into(), "orange".into()])
        .await
        .unwrap();
    assert_eq!(tags, vec!["sky", "orange"]);

    let user_id = h.session.messages().await[0].id.clone();
    let err = h
        .session
        .update_image_tags(&user_id, vec!["x".into()])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ----------------------------------------------------------------------------
// Memories & journal
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_reflect_requires_enough_messages() {
    let h = harness(vec![text("a"), text("b")]);
    h.session.send_message(UserInput::text("one")).await.unwrap();
    h.session.send_message(UserInput::text("two")).await.unwrap();

    let err = h.session.reflect().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.service.requests().len(), 2);
    assert!(!h.session.is_generating());
}

#[tokio::test]
async fn test_reflect_filters_known_memories() {
    let h = harness(vec![
        text("a"),
        text("b"),
        text("c"),
        Ok(AiReply::MemorySuggestions(vec![
            "Has a dog named Rex".to_string(),
            "likes tea".to_string(),
            " ".to_string(),
        ])),
    ]);
    for input in ["one", "two", "three"] {
        h.session.send_message(UserInput::text(input)).await.unwrap();
    }
    h.session.add_memory("Likes tea").await.unwrap();

    let suggestions = h.session.reflect().await.unwrap();
    assert_eq!(suggestions, vec!["Has a dog named Rex"]);
    assert_eq!(h.session.memories().await.len(), 1);
}

#[tokio::test]
async fn test_journal_entries_are_newest_first() {
    let h = harness(vec![
        text("hello"),
        Ok(AiReply::JournalText("We met today.".to_string())),
        Ok(AiReply::JournalText("We talked again.".to_string())),
    ]);
    assert!(h.session.generate_journal_entry().await.unwrap_err().is_validation());

    h.session.send_message(UserInput::text("hi")).await.unwrap();
    h.session.generate_journal_entry().await.unwrap();
    let latest = h.session.generate_journal_entry().await.unwrap();

    let journal = h.session.journal().await;
    assert_eq!(journal[0].id, latest.id);
    assert_eq!(journal[1].content, "We met today.");

    match &h.service.requests()[2] {
        AiRequest::Journal(request) => {
            assert_eq!(request.previous_entries, vec!["We met today."]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn test_memory_crud_through_session() {
    let h = harness(Vec::new());
    let entry = h.session.add_memory("  Works night shifts ").await.unwrap();
    assert_eq!(entry.content, "Works night shifts");

    h.session.update_memory(&entry.id, "Works day shifts now").await.unwrap();
    assert!(h.session.add_memory("").await.unwrap_err().is_validation());

    h.session.delete_memory(&entry.id).await.unwrap();
    assert!(h.session.memories().await.is_empty());
    assert!(h.session.delete_memory(&entry.id).await.unwrap_err().is_not_found());
}

// ----------------------------------------------------------------------------
// Speech
// ----------------------------------------------------------------------------

fn speech() -> Result<AiReply> {
    Ok(AiReply::Speech(SpeechReply::new("AEAAwA==")))
}

#[tokio::test]
async fn test_play_message_audio_is_mutually_exclusive() {
    let h = harness(vec![text("*smiles* Hi"), text("Bye"), speech(), speech()]);
    h.session
        .set_tts_config(TtsConfig {
            enabled: true,
            ..TtsConfig::default()
        })
        .await
        .unwrap();
    let first = h.session.send_message(UserInput::text("hello")).await.unwrap();
    let second = h.session.send_message(UserInput::text("goodbye")).await.unwrap();

    assert!(h.session.play_message_audio(&first.id).await.unwrap());
    assert!(h.session.play_message_audio(&second.id).await.unwrap());

    assert_eq!(
        *h.audio_events.lock().unwrap(),
        vec!["start:1", "stop:1", "start:2"]
    );
    assert!(h.session.is_playing());
    assert!(h.session.stop_audio());
    assert!(!h.session.is_playing());

    match &h.service.requests()[2] {
        AiRequest::Speech(request) => assert_eq!(request.text, "smiles Hi"),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn test_play_message_audio_skips_ineligible_messages() {
    let h = harness(vec![text("Hi"), text("(out of character)")]);
    let reply = h.session.send_message(UserInput::text("hello")).await.unwrap();

    // Speech disabled by default.
    assert!(!h.session.play_message_audio(&reply.id).await.unwrap());

    h.session
        .set_tts_config(TtsConfig {
            enabled: true,
            ..TtsConfig::default()
        })
        .await
        .unwrap();
    let user_id = h.session.messages().await[0].id.clone();
    assert!(!h.session.play_message_audio(&user_id).await.unwrap());

    let ooc = h.session.send_message(UserInput::text("(pause)")).await.unwrap();
    assert!(!h.session.play_message_audio(&ooc.id).await.unwrap());
    assert!(h.session.play_message_audio("missing").await.unwrap_err().is_not_found());

    assert_eq!(h.service.requests().len(), 2);
    assert!(h.audio_events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_speech_payload_is_playback_error() {
    let h = harness(vec![
        text("Hi"),
        Ok(AiReply::Speech(SpeechReply::new("AEA"))),
    ]);
    h.session
        .set_tts_config(TtsConfig {
            enabled: true,
            ..TtsConfig::default()
        })
        .await
        .unwrap();
    let reply = h.session.send_message(UserInput::text("hello")).await.unwrap();

    let err = h.session.play_message_audio(&reply.id).await.unwrap_err();
    assert!(err.is_playback());
    assert!(!h.session.is_playing());
}

// ----------------------------------------------------------------------------
// Backup & gallery
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_import_without_markers_leaves_state_untouched() {
    let h = harness(vec![text("Hi")]);
    h.session.send_message(UserInput::text("hello")).await.unwrap();
    let before = h.session.snapshot().await;

    let err = h
        .session
        .import_backup(r#"{"memories": [], "journal": []}"#)
        .await
        .unwrap_err();

    assert!(err.is_import());
    assert_eq!(h.session.snapshot().await, before);
}

#[tokio::test]
async fn test_backup_round_trip_between_sessions() {
    let h = harness(vec![text("Hi")]);
    h.session.send_message(UserInput::text("hello")).await.unwrap();
    h.session.add_memory("Likes jazz").await.unwrap();
    let backup = h.session.export_backup().await.unwrap();

    let other = harness(Vec::new());
    other.session.import_backup(&backup).await.unwrap();

    assert_eq!(other.session.snapshot().await, h.session.snapshot().await);
    let saved = other.repository.load(SESSION_KEY).await.unwrap().unwrap();
    assert_eq!(saved.memories[0].content, "Likes jazz");
}

#[tokio::test]
async fn test_gallery_export_selected_clears_selection() {
    let h = harness(vec![image("QQ=="), image("Qg==")]);
    let a = h
        .session
        .send_message(UserInput::text("generate a photo: a"))
        .await
        .unwrap();
    h.session
        .send_message(UserInput::text("generate a photo: b"))
        .await
        .unwrap();

    assert!(h.session.toggle_gallery_selection(&a.id).await.unwrap());
    assert!(h.session.toggle_gallery_selection("missing").await.unwrap_err().is_not_found());

    let path = h.session.export_selected_images().await.unwrap();
    assert_eq!(path, PathBuf::from(GALLERY_ARCHIVE_NAME));
    assert!(h.session.gallery_selection().await.is_empty());

    let written = h.writer.written.lock().unwrap();
    assert_eq!(written[0].1.len(), 1);
    assert!(written[0].1[0].name.contains(&a.id));
}

#[tokio::test]
async fn test_gallery_export_failure_still_clears_selection() {
    let h = harness_with(
        MockService::with_replies(vec![image("QQ==")]),
        MockWriter {
            fail: true,
            ..MockWriter::default()
        },
    );
    h.session
        .send_message(UserInput::text("generate a photo: a"))
        .await
        .unwrap();

    assert_eq!(h.session.select_all_visible(GalleryTab::Generated, None).await, 1);
    assert!(h.session.export_selected_images().await.is_err());
    assert!(h.session.gallery_selection().await.is_empty());
}

#[tokio::test]
async fn test_export_all_includes_backup_and_images() {
    let h = harness(vec![image("QQ==")]);
    h.session
        .send_message(UserInput::text("generate a photo: a"))
        .await
        .unwrap();

    h.session.export_all().await.unwrap();

    let written = h.writer.written.lock().unwrap();
    let names: Vec<&str> = written[0].1.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names[0], "data.json");
    assert_eq!(names[1], "README.txt");
    assert!(names[2].starts_with("images/image_ai-"));
}

#[tokio::test]
async fn test_select_all_visible_respects_tab_and_tag() {
    let h = harness(vec![image("QQ=="), image("Qg==")]);
    let first = h
        .session
        .send_message(UserInput::text("generate a photo: beach"))
        .await
        .unwrap();
    h.session
        .send_message(UserInput::text("generate a photo: city"))
        .await
        .unwrap();
    h.session.update_image_tags(&first.id, vec!["#beach".to_string()]).await.unwrap();

    assert_eq!(h.session.select_all_visible(GalleryTab::Uploaded, None).await, 0);
    assert_eq!(
        h.session.select_all_visible(GalleryTab::Generated, Some("beach")).await,
        1
    );
    assert_eq!(h.session.gallery_selection().await, vec![first.id.clone()]);

    h.session.export_selected_images().await.unwrap();
    let written = h.writer.written.lock().unwrap();
    assert_eq!(written[0].1.len(), 1);
    assert!(written[0].1[0].name.contains(&first.id));
}

// ----------------------------------------------------------------------------
// Settings
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_update_companion_settings_persists() {
    let h = harness(vec![]);
    let settings = CompanionSettings {
        name: "Kai".to_string(),
        art_style: ArtStyle::Anime,
        ..CompanionSettings::default()
    };
    h.session.update_companion_settings(settings.clone()).await.unwrap();

    assert_eq!(h.session.snapshot().await.companion_settings, settings);
    let saved = h.repository.load(SESSION_KEY).await.unwrap().unwrap();
    assert_eq!(saved.companion_settings.name, "Kai");
}

#[tokio::test]
async fn test_blank_companion_name_is_rejected() {
    let h = harness(vec![]);
    let err = h
        .session
        .update_companion_settings(CompanionSettings {
            name: "   ".to_string(),
            ..CompanionSettings::default()
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(h.session.snapshot().await.companion_settings.name, "Aria");
    assert!(h.repository.load(SESSION_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_interface_settings() {
    let h = harness(vec![]);
    h.session
        .set_interface_settings(InterfaceSettings { ui_sounds: false })
        .await
        .unwrap();

    assert!(!h.session.snapshot().await.interface_settings.ui_sounds);
    let saved = h.repository.load(SESSION_KEY).await.unwrap().unwrap();
    assert!(!saved.interface_settings.ui_sounds);
}

// ----------------------------------------------------------------------------
// Persistence
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_restore_from_json_repository() {
    let temp = tempfile::tempdir().unwrap();
    let collaborators = || SessionCollaborators {
        ai: Arc::new(MockService::with_replies(vec![text("Hi there")])),
        repository: Arc::new(JsonStateRepository::new(temp.path())),
        audio_sink: Arc::new(MockSink::default()),
        archive_writer: Arc::new(MockWriter::default()),
    };

    let session = CompanionSession::new(collaborators());
    session.send_message(UserInput::text("hello")).await.unwrap();
    drop(session);

    let restored = CompanionSession::new(collaborators());
    assert!(restored.restore().await.unwrap());
    let messages = restored.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "Hi there");
}
