//! Text completion used for relevance filtering.
//!
//! [`TextCompletion`] is the seam; [`OpenRouterCompletion`] talks to the
//! OpenRouter chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use gardenlink_shared::{GardenError, OpenRouterConfig, Result, resolve_api_key};

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("gardenlink/", env!("CARGO_PKG_VERSION"));

/// Completions over large knowledge buffers are slow.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Prompt in, text out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenRouterCompletion
// ---------------------------------------------------------------------------

/// Single-turn chat completion against an OpenRouter-compatible endpoint.
pub struct OpenRouterCompletion {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenRouterCompletion {
    pub fn new(base_url: &str, model: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GardenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from the `[openrouter]` config section, reading the key from the environment.
    pub fn from_config(config: &OpenRouterConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(&config.base_url, config.default_model.clone(), api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextCompletion for OpenRouterCompletion {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GardenError::Completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(GardenError::Completion(format!("HTTP {status}: {excerpt}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GardenError::Completion(format!("invalid response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GardenError::Completion("response contained no choices".into()))?;

        debug!(response_len = text.len(), "completion received");
        Ok(text)
    }
}
