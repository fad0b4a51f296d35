//! Hugging Face router provider (OpenAI-compatible chat completions)

use async_trait::async_trait;

use crate::{
    error::Result,
    providers::{CompletionService, openai::OpenAIProvider},
    types::{ChatOptions, ChatResponse, Message, Provider},
};

/// Reply length cap used when the caller does not set one; the router
/// otherwise applies per-model defaults that are often very small.
const DEFAULT_MAX_TOKENS: u32 = 500;

/// Hugging Face inference router client
pub struct HuggingFaceProvider {
    inner: OpenAIProvider,
}

impl HuggingFaceProvider {
    /// Create a new provider with an access token
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            inner: OpenAIProvider::new(api_token)
                .with_base_url(Provider::HuggingFace.default_base_url())
                .with_default_max_tokens(Some(DEFAULT_MAX_TOKENS)),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let token = super::get_api_key(None, Provider::HuggingFace.api_key_env_var())?;
        Ok(Self::new(token))
    }

    /// Point the client at another router deployment
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner = self.inner.with_base_url(base_url);
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.inner = self.inner.with_client(client);
        self
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}

#[async_trait]
impl CompletionService for HuggingFaceProvider {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse> {
        self.inner.chat(messages, model, options).await
    }
}
