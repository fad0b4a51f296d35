//! OpenAI Chat Completions API provider
//!
//! Also the wire implementation for other OpenAI-compatible endpoints, which
//! only differ by base URL and defaults.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    providers::CompletionService,
    types::{ChatOptions, ChatResponse, Message, Provider, TokenUsage},
};

/// OpenAI API client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_max_tokens: Option<u32>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: Provider::OpenAI.default_base_url().to_string(),
            default_max_tokens: None,
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = super::get_api_key(None, Provider::OpenAI.api_key_env_var())?;
        Ok(Self::new(api_key))
    }

    /// Point the client at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// `max_tokens` sent when the caller does not set one
    pub fn with_default_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(
        &self,
        messages: &'a [Message],
        model: &'a str,
        options: &ChatOptions,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            max_tokens: options.max_tokens.or(self.default_max_tokens),
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse> {
        let request = self.build_request(messages, model, options);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            model,
            url = %url,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Chat completion request failed");
            return Err(parse_error_body(status.as_u16(), &text));
        }

        parse_success_body(&text)
    }
}

/// Convert a non-2xx body into an API error.
///
/// Accepts `{"error": {"message", "code", "param"}}`, `{"error": "text"}`,
/// `{"message": "text"}`, and falls back to the raw body.
pub(crate) fn parse_error_body(status: u16, body: &str) -> Error {
    let raw = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body.trim().to_string()
    };

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return Error::Api {
                message: raw,
                code: None,
                param: None,
                status: Some(status),
            };
        }
    };

    let (message, code, param) = match value.get("error") {
        Some(serde_json::Value::Object(obj)) => (
            obj.get("message").and_then(|m| m.as_str()).map(str::to_string),
            obj.get("code")
                .or_else(|| obj.get("type"))
                .and_then(json_scalar_to_string),
            obj.get("param").and_then(json_scalar_to_string),
        ),
        Some(serde_json::Value::String(s)) => (Some(s.clone()), None, None),
        _ => (
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            None,
            None,
        ),
    };

    Error::Api {
        message: message.unwrap_or(raw),
        code,
        param,
        status: Some(status),
    }
}

/// Parse a 2xx chat-completions body. An empty choice list is an empty reply.
pub(crate) fn parse_success_body(body: &str) -> Result<ChatResponse> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Parse(format!("{} (body: {})", e, preview))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    Ok(ChatResponse {
        content,
        usage: parsed.usage.map(WireUsage::into_usage),
    })
}

fn json_scalar_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl WireUsage {
    fn into_usage(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self
                .total_tokens
                .unwrap_or(self.prompt_tokens.saturating_add(self.completion_tokens)),
        }
    }
}
