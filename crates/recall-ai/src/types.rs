//! Core types for chat-completion interactions

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Known chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenAI,
    HuggingFace,
}

impl Provider {
    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::HuggingFace => "Hugging Face",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::HuggingFace => "HF_TOKEN",
        }
    }

    /// Default base URL of the provider's chat-completions endpoint
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::HuggingFace => "https://router.huggingface.co/v1",
        }
    }
}

/// Selectable models. The serialized form is the provider-side model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "meta-llama/Llama-3.2-1B-Instruct")]
    Llama32_1b,
    #[serde(rename = "Qwen/Qwen2.5-Coder-32B-Instruct")]
    Qwen25Coder32b,
    #[serde(rename = "HuggingFaceTB/SmolLM2-1.7B-Instruct")]
    SmolLm2,
}

impl ModelId {
    /// Provider-side model identifier sent on the wire
    pub fn id(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Llama32_1b => "meta-llama/Llama-3.2-1B-Instruct",
            ModelId::Qwen25Coder32b => "Qwen/Qwen2.5-Coder-32B-Instruct",
            ModelId::SmolLm2 => "HuggingFaceTB/SmolLM2-1.7B-Instruct",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "GPT-4o",
            ModelId::Gpt4oMini => "GPT-4o mini",
            ModelId::Llama32_1b => "Llama 3.2 1B",
            ModelId::Qwen25Coder32b => "Qwen 2.5 Coder 32B",
            ModelId::SmolLm2 => "SmolLM2 1.7B",
        }
    }

    /// Provider that serves this model
    pub fn provider(&self) -> Provider {
        match self {
            ModelId::Gpt4o | ModelId::Gpt4oMini => Provider::OpenAI,
            ModelId::Llama32_1b | ModelId::Qwen25Coder32b | ModelId::SmolLm2 => {
                Provider::HuggingFace
            }
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Token usage reported by the provider for a single call.
///
/// `total_tokens` is trusted as reported; it is not recomputed from the
/// other two fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message. Insertion order is conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            usage: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            usage: None,
        }
    }

    /// Create an assistant message without usage
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            usage: None,
        }
    }

    /// Create an assistant message carrying the usage of the call that produced it
    pub fn assistant_with_usage(content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            usage,
        }
    }
}

/// Per-call knobs passed alongside the message list
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Reply of a completed chat call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_add_is_fieldwise() {
        let mut total = TokenUsage::default();
        total += TokenUsage::new(10, 5, 15);
        total += TokenUsage::new(1, 2, 3);
        assert_eq!(total, TokenUsage::new(11, 7, 18));
    }

    #[test]
    fn test_usage_add_saturates() {
        let total = TokenUsage::new(u32::MAX, 0, u32::MAX) + TokenUsage::new(1, 1, 1);
        assert_eq!(total, TokenUsage::new(u32::MAX, 1, u32::MAX));
    }

    #[test]
    fn test_message_serialization_omits_missing_usage() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_message_usage_uses_camel_case() {
        let msg = Message::assistant_with_usage("ok", Some(TokenUsage::new(3, 4, 7)));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["usage"]["promptTokens"], 3);
        assert_eq!(json["usage"]["totalTokens"], 7);
    }

    #[test]
    fn test_model_provider_mapping() {
        assert_eq!(ModelId::Gpt4o.provider(), Provider::OpenAI);
        assert_eq!(ModelId::SmolLm2.provider(), Provider::HuggingFace);
        assert_eq!(ModelId::Llama32_1b.id(), "meta-llama/Llama-3.2-1B-Instruct");
    }

    #[test]
    fn test_model_serializes_as_wire_id() {
        let json = serde_json::to_string(&ModelId::Qwen25Coder32b).unwrap();
        assert_eq!(json, "\"Qwen/Qwen2.5-Coder-32B-Instruct\"");
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ModelId::Qwen25Coder32b);
    }
}
