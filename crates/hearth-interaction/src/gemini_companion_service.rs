//! GeminiCompanionService - Direct REST implementation of the AI collaborator.
//!
//! Chat, reflection and journal requests go to the text model, image requests
//! to the image model and speech requests to the TTS model. The API key comes
//! from secret.json (or `GEMINI_API_KEY`); models and endpoint from config.toml.

use std::time::Duration;

use async_trait::async_trait;
use hearth_core::ai::{
    AiReply, AiRequest, CompanionService, ConversationContext, ImageReply, ImageRequest,
    JournalRequest, ReflectionRequest, SpeechReply, SpeechRequest, TextReply,
};
use hearth_core::audio::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use hearth_core::config::{GeminiConfig, SecretConfig};
use hearth_core::error::{HearthError, Result};
use hearth_core::message::{
    GroundingKind, GroundingSource, Message, PlaceAnswerSources, ReviewSnippet, Sender,
};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::prompts::PromptRenderer;

/// Companion service backed by the Gemini HTTP API.
pub struct GeminiCompanionService {
    client: Client,
    api_key: String,
    config: GeminiConfig,
    prompts: PromptRenderer,
}

impl GeminiCompanionService {
    /// Creates a service with the provided API key and model configuration.
    pub fn new(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| HearthError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
            prompts: PromptRenderer::new()?,
        })
    }

    /// Builds the service from loaded secrets.
    ///
    /// # Errors
    ///
    /// `HearthError::Config` when no Gemini API key is configured.
    pub fn from_secrets(secrets: &SecretConfig, config: GeminiConfig) -> Result<Self> {
        let api_key = secrets.gemini_api_key().ok_or_else(|| {
            HearthError::config("Gemini API key not found in secret.json or GEMINI_API_KEY")
        })?;
        Self::new(api_key, config)
    }

    async fn chat(&self, ctx: ConversationContext) -> Result<AiReply> {
        let system = self.prompts.system_instruction(&ctx)?;

        let mut contents: Vec<Content> = ctx.history.iter().map(message_content).collect();
        contents.push(message_content(&ctx.latest));

        let tool_config = ctx.location.map(|location| {
            json!({
                "retrievalConfig": {
                    "latLng": {"latitude": location.latitude, "longitude": location.longitude}
                }
            })
        });

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(system)),
            tools: Some(vec![json!({"googleSearch": {}}), json!({"googleMaps": {}})]),
            tool_config,
            generation_config: None,
        };

        let response = self.send_request(&self.config.text_model, &request).await?;
        let grounding = extract_grounding(&response);
        let text = extract_text(&response)?;
        debug!(grounding_count = grounding.len(), "Received chat reply");

        Ok(AiReply::Text(TextReply {
            text,
            grounding,
            link: None,
            model_url: None,
        }))
    }

    async fn image(&self, request: ImageRequest) -> Result<AiReply> {
        let mut parts = vec![Part::text(request.composed_prompt())];
        if let Some(part) = request.reference_image.as_deref().and_then(inline_part_from_data_uri) {
            parts.push(part);
        }

        let body = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: Some(json!({"responseModalities": ["TEXT", "IMAGE"]})),
            ..GenerateContentRequest::default()
        };

        let response = self.send_request(&self.config.image_model, &body).await?;
        let parts = candidate_parts(&response);

        let image = parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .ok_or_else(|| HearthError::request("the image model returned no image"))?;
        let caption = parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string);

        Ok(AiReply::Image(ImageReply {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
            caption,
        }))
    }

    async fn speech(&self, request: SpeechRequest) -> Result<AiReply> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(request.text)])],
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": {"voiceName": request.voice.voice_name()}
                    }
                }
            })),
            ..GenerateContentRequest::default()
        };

        let response = self.send_request(&self.config.speech_model, &body).await?;
        let audio = candidate_parts(&response)
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .ok_or_else(|| HearthError::request("the speech model returned no audio"))?;

        Ok(AiReply::Speech(SpeechReply {
            pcm_base64: audio.data.clone(),
            sample_rate: parse_sample_rate(&audio.mime_type).unwrap_or(SPEECH_SAMPLE_RATE),
            channels: SPEECH_CHANNELS,
        }))
    }

    async fn reflection(&self, request: ReflectionRequest) -> Result<AiReply> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(self.prompts.reflection(&request)?)])],
            generation_config: Some(json!({
                "responseMimeType": "application/json",
                "responseSchema": {"type": "ARRAY", "items": {"type": "STRING"}}
            })),
            ..GenerateContentRequest::default()
        };

        let response = self.send_request(&self.config.text_model, &body).await?;
        let text = extract_text(&response)?;
        let suggestions: Vec<String> = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| HearthError::request(format!("memory suggestions were not a JSON list: {}", e)))?;

        Ok(AiReply::MemorySuggestions(suggestions))
    }

    async fn journal(&self, request: JournalRequest) -> Result<AiReply> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(self.prompts.journal(&request)?)])],
            ..GenerateContentRequest::default()
        };

        let response = self.send_request(&self.config.text_model, &body).await?;
        Ok(AiReply::JournalText(extract_text(&response)?))
    }

    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/models/{model}:generateContent?key={api_key}",
            self.config.base_url.trim_end_matches('/'),
            model = model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                let is_retryable = err.is_connect() || err.is_timeout();
                HearthError::Request {
                    message: Some(format!("Gemini API request failed: {}", err.without_url())),
                    status_code: None,
                    is_retryable,
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            if let Some(delay) = retry_after {
                warn!(status = status.as_u16(), retry_after_secs = delay.as_secs(), "Gemini asked to retry later");
            }
            return Err(map_http_error(status, body_text));
        }

        response.json().await.map_err(|err| {
            HearthError::request(format!("Failed to parse Gemini response: {}", err))
        })
    }
}

#[async_trait]
impl CompanionService for GeminiCompanionService {
    async fn respond(&self, request: AiRequest) -> Result<AiReply> {
        match request {
            AiRequest::Chat(ctx) => self.chat(ctx).await,
            AiRequest::Image(request) => self.image(request).await,
            AiRequest::Speech(request) => self.speech(request).await,
            AiRequest::Reflection(request) => self.reflection(request).await,
            AiRequest::Journal(request) => self.journal(request).await,
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    fn system(text: String) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
    maps: Option<MapsChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapsChunk {
    uri: Option<String>,
    title: Option<String>,
    place_answer_sources: Option<MapsAnswerSources>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapsAnswerSources {
    #[serde(default)]
    review_snippets: Vec<MapsReviewSnippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapsReviewSnippet {
    #[serde(alias = "googleMapsUri")]
    uri: Option<String>,
    #[serde(alias = "text")]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn message_content(message: &Message) -> Content {
    let role = match message.sender {
        Sender::User => "user",
        Sender::Ai => "model",
    };

    let mut parts = Vec::new();
    if !message.text.trim().is_empty() {
        parts.push(Part::text(message.text.clone()));
    }
    if let Some(file) = &message.file {
        parts.push(Part::text(format!(
            "Attached file \"{}\":\n{}",
            file.name, file.content
        )));
    }
    // Generated images are not sent back as input.
    if message.is_user() {
        if let Some(part) = message
            .image
            .as_ref()
            .and_then(|image| inline_part_from_data_uri(&image.src))
        {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        parts.push(Part::text("..."));
    }

    Content {
        role: role.to_string(),
        parts,
    }
}

/// Splits `data:<mime>;base64,<data>` into an inline data part.
fn inline_part_from_data_uri(uri: &str) -> Option<Part> {
    let (header, data) = uri.strip_prefix("data:")?.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    Some(Part::InlineData {
        inline_data: InlineData {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        },
    })
}

fn candidate_parts(response: &GenerateContentResponse) -> &[PartResponse] {
    response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or(&[])
}

fn extract_text(response: &GenerateContentResponse) -> Result<String> {
    let text: String = candidate_parts(response)
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(HearthError::request(
            "Gemini API returned no text in the response candidates",
        ));
    }
    Ok(text.trim().to_string())
}

fn extract_grounding(response: &GenerateContentResponse) -> Vec<GroundingSource> {
    let Some(metadata) = response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
    else {
        return Vec::new();
    };

    metadata
        .grounding_chunks
        .iter()
        .filter_map(|chunk| {
            if let Some(web) = &chunk.web {
                return Some(GroundingSource {
                    uri: web.uri.clone()?,
                    title: web.title.clone().unwrap_or_default(),
                    kind: GroundingKind::Web,
                    place_answer_sources: None,
                });
            }
            let maps = chunk.maps.as_ref()?;
            let place_answer_sources = maps.place_answer_sources.as_ref().map(|sources| {
                PlaceAnswerSources {
                    review_snippets: sources
                        .review_snippets
                        .iter()
                        .map(|snippet| ReviewSnippet {
                            uri: snippet.uri.clone().unwrap_or_default(),
                            content: snippet.content.clone().unwrap_or_default(),
                        })
                        .collect(),
                }
            });
            Some(GroundingSource {
                uri: maps.uri.clone()?,
                title: maps.title.clone().unwrap_or_default(),
                kind: GroundingKind::Maps,
                place_answer_sources,
            })
        })
        .collect()
}

/// Strips a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

/// Reads `rate=<hz>` from a PCM mime type such as `audio/L16;codec=pcm;rate=24000`.
fn parse_sample_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

fn map_http_error(status: StatusCode, body: String) -> HearthError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    HearthError::Request {
        message: Some(message),
        status_code: Some(status.as_u16()),
        is_retryable,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // Retry-After HTTP-date form is not handled
    value.parse::<u64>().ok().map(Duration::from_secs)
}
