//! Text-understanding clients. Exactly one attempt per completion; retry
//! policy belongs to whoever wraps these.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use responder_core::config::{TextProvider, TextUnderstandingConfig};
use responder_core::traits::{CompletionPurpose, CompletionRequest, TextUnderstanding};
use responder_core::{ResponderError, ResponderResult};

use crate::http::{build_client, ensure_success, transport_error};

const SERVICE: &str = "text-understanding";

pub fn build_text_understanding(
    config: &TextUnderstandingConfig,
) -> ResponderResult<Arc<dyn TextUnderstanding>> {
    Ok(match config.provider {
        TextProvider::Gemini => Arc::new(GeminiClient::new(config)?),
        TextProvider::OpenaiCompatible => Arc::new(ChatCompletionsClient::new(config)?),
    })
}

fn model_for<'a>(config: &'a TextUnderstandingConfig, purpose: CompletionPurpose) -> &'a str {
    match (purpose, &config.tier_model) {
        (CompletionPurpose::AmbulanceTier, Some(tier_model)) => tier_model,
        _ => &config.model,
    }
}

/// Google Generative Language `generateContent` client.
pub struct GeminiClient {
    http: Client,
    config: TextUnderstandingConfig,
}

impl GeminiClient {
    pub fn new(config: &TextUnderstandingConfig) -> ResponderResult<Self> {
        Ok(Self {
            http: build_client(config.timeout())?,
            config: config.clone(),
        })
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": { "temperature": self.config.temperature },
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

fn gemini_text(response: GeminiResponse) -> ResponderResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ResponderError::collaborator(SERVICE, "response contained no text"));
    }
    Ok(text)
}

#[async_trait]
impl TextUnderstanding for GeminiClient {
    #[instrument(skip_all, fields(purpose = ?request.purpose))]
    async fn complete(&self, request: &CompletionRequest) -> ResponderResult<String> {
        let model = model_for(&self.config, request.purpose);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        );
        debug!(model, "requesting completion");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let parsed: GeminiResponse = response.json().await.map_err(|e| transport_error(SERVICE, e))?;
        gemini_text(parsed)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsClient {
    http: Client,
    config: TextUnderstandingConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: &TextUnderstandingConfig) -> ResponderResult<Self> {
        Ok(Self {
            http: build_client(config.timeout())?,
            config: config.clone(),
        })
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));
        json!({
            "model": model_for(&self.config, request.purpose),
            "messages": messages,
            "temperature": self.config.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn chat_text(response: ChatResponse) -> ResponderResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ResponderError::collaborator(SERVICE, "response contained no choices"))
}

#[async_trait]
impl TextUnderstanding for ChatCompletionsClient {
    #[instrument(skip_all, fields(purpose = ?request.purpose))]
    async fn complete(&self, request: &CompletionRequest) -> ResponderResult<String> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| transport_error(SERVICE, e))?;
        chat_text(parsed)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
