//! Minimal OpenAI client for the generation gateway.
//!
//! We only call chat.completions with a single user message and plain-text output.
//! Calls are instrumented and log model name, latency, and token usage (not contents).
//!
//! NOTE: We never log the API key or the prompt text.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::OpenAIConfig;
use crate::gateway::{GenerationError, TextGenerator};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub max_tokens: u32,
  pub temperature: f32,
}

impl OpenAI {
  pub fn new(cfg: &OpenAIConfig, temperature: f32) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
    Ok(Self {
      client,
      api_key: cfg.api_key.clone(),
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model.clone(),
      max_tokens: cfg.max_tokens,
      temperature,
    })
  }

  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn chat_plain(&self, prompt: &str) -> Result<String, GenerationError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = self.build_request(prompt);

    let res = self.client.post(&url)
      .header(USER_AGENT, "interview-prep/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| GenerationError::Network(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(classify_http_failure(status, &body));
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    extract_text(body)
  }
}

impl OpenAI {
  fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      temperature: self.temperature,
      max_tokens: Some(self.max_tokens),
    }
  }
}

#[async_trait]
impl TextGenerator for OpenAI {
  async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
    self.chat_plain(prompt).await
  }
}

fn extract_text(body: ChatCompletionResponse) -> Result<String, GenerationError> {
  let text = body.choices.into_iter().next()
    .and_then(|c| c.message.content)
    .map(|s| s.trim().to_string())
    .unwrap_or_default();
  if text.is_empty() {
    Err(GenerationError::MalformedResponse("no message content in response".into()))
  } else {
    Ok(text)
  }
}

/// Map a non-2xx response to a failure class. 429 and `insufficient_quota`
/// errors are quota problems; everything else is a plain HTTP failure.
fn classify_http_failure(status: StatusCode, body: &str) -> GenerationError {
  let detail = extract_openai_error(body);
  let message = detail.as_ref().map(|d| d.message.clone()).unwrap_or_else(|| body.to_string());
  let quota_code = detail.as_ref()
    .and_then(|d| d.code.as_deref().or(d.r#type.as_deref()))
    .map(|c| c == "insufficient_quota")
    .unwrap_or(false);

  if status == StatusCode::TOO_MANY_REQUESTS || quota_code {
    GenerationError::Quota(message)
  } else {
    GenerationError::Http { status: status.as_u16(), message }
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorDetail {
  message: String,
  #[serde(default)] r#type: Option<String>,
  #[serde(default)] code: Option<String>,
}

/// Try to extract the structured error from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<ErrorDetail> {
  #[derive(Deserialize)]
  struct EWrap { error: ErrorDetail }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error)
}
