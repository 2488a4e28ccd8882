/// LLM client: the single point of entry for all completion calls in docgen.
///
/// ARCHITECTURAL RULE: No other module may talk to the completion API directly.
/// Everything goes through `CompletionBackend`, which `LlmClient` implements.
///
/// Transport failures (network errors, timeouts, non-2xx, malformed envelopes)
/// are absorbed here: `CompletionBackend::complete` returns `None` and the
/// caller applies its own fallback.
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod prompts;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),

    #[error("API credential is missing")]
    MissingCredential,

    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

// ────────────────────────────────────────────────────────────────────────────
// Provider selection
// ────────────────────────────────────────────────────────────────────────────

/// Chat-completions compatible providers. Both speak the same wire format;
/// they differ only in default endpoint and model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    DeepSeek,
    OpenAi,
}

#[derive(Debug, Error)]
#[error("unknown provider '{0}' (expected 'deepseek' or 'openai')")]
pub struct UnknownProvider(String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Provider::DeepSeek),
            "openai" => Ok(Provider::OpenAi),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

impl Provider {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Provider::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek-chat",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion call: ordered messages plus sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// The common shape: fixed system instruction followed by one user prompt.
    pub fn new(system: &str, prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.messages.is_empty() {
            return Err(LlmError::InvalidRequest("messages cannot be empty".into()));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature {} is outside [0, {MAX_TEMPERATURE}]",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::InvalidRequest("max_tokens must be positive".into()));
        }
        Ok(())
    }

    fn last_prompt_preview(&self) -> String {
        self.messages
            .last()
            .map(|m| m.content.trim().chars().take(100).collect())
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Bounded exponential backoff around a single HTTP call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay slept before retry number `retry` (1-based): base * 2^(retry-1), capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the envelope carries one.
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
    }
}

/// Pulls the first choice's text out of a raw response body.
fn extract_text(body: &str) -> Result<String, LlmError> {
    let envelope: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedEnvelope(e.to_string()))?;

    if let Some(usage) = &envelope.usage {
        debug!(
            "Completion usage: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    envelope
        .into_text()
        .ok_or_else(|| LlmError::MalformedEnvelope("missing choices[0].message.content".into()))
}

// ────────────────────────────────────────────────────────────────────────────
// Backend seam
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a completion request into raw text.
///
/// Never fails outward: `None` means "no text available" and callers must
/// fall back.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Option<String>;
}

/// Chat-completions client with bearer auth and bounded retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

impl LlmClient {
    /// Refuses to build without a credential: a missing key is a deployment
    /// mistake, not something to degrade around.
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingCredential);
        }

        let client = Client::builder().timeout(timeout).build()?;

        info!("LLM client initialized (endpoint: {endpoint}, model: {model})");

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            config.ai_api_key.clone(),
            config.ai_api_endpoint.clone(),
            config.ai_model.clone(),
            Duration::from_secs(config.ai_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes the call, retrying network errors and non-2xx responses with
    /// exponential backoff. A malformed envelope is not retried.
    pub async fn try_complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        request.validate()?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!(
            "Sending completion request: model={}, temperature={}, max_tokens={}",
            self.model, request.temperature, request.max_tokens
        );
        debug!("Prompt preview: {}...", request.last_prompt_preview());

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    "Completion attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    if e.is_timeout() {
                        warn!("Completion request timed out: {e}");
                    } else {
                        warn!("Completion request failed: {e}");
                    }
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to read completion body: {e}");
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            if !status.is_success() {
                warn!("Completion API returned {}: {}", status, text);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                continue;
            }

            let content = extract_text(&text)?;
            debug!(
                "Completion succeeded on attempt {}: {}...",
                attempt + 1,
                content.chars().take(150).collect::<String>()
            );
            return Ok(content);
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: self.retry.max_attempts,
        }))
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Option<String> {
        match self.try_complete(request).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Completion unavailable: {e}");
                None
            }
        }
    }
}
