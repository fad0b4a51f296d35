//! Completion service implementations

pub mod huggingface;
pub mod openai;

use crate::{ChatOptions, ChatResponse, Error, Message, Result};
use async_trait::async_trait;

/// A remote model that turns an ordered message list into a reply
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `messages` to `model` and wait for the complete reply
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse>;
}

/// Get an API key from the provided value or the environment
pub fn get_api_key(provided: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = provided.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Error::InvalidApiKey)
}
