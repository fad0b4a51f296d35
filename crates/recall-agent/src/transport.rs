//! Dispatch of chat calls to the completion service of each provider

use std::collections::HashMap;
use std::sync::Arc;

use recall_ai::{
    ChatOptions, ChatResponse, CompletionService, Message, ModelId, Provider, Result,
    providers::{huggingface::HuggingFaceProvider, openai::OpenAIProvider},
};

/// Routes a call to the service registered for the model's provider
#[derive(Clone, Default)]
pub struct ProviderRouter {
    services: HashMap<Provider, Arc<dyn CompletionService>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the service for a provider
    pub fn register(&mut self, provider: Provider, service: Arc<dyn CompletionService>) {
        self.services.insert(provider, service);
    }

    /// Builder-style `register`
    pub fn with(mut self, provider: Provider, service: Arc<dyn CompletionService>) -> Self {
        self.register(provider, service);
        self
    }

    /// Build a router with the HTTP providers whose keys are available.
    /// Keys come from the arguments first, then the environment; providers
    /// without a key are left unregistered.
    pub fn from_keys(openai_key: Option<&str>, huggingface_key: Option<&str>) -> Self {
        let mut router = Self::new();

        match recall_ai::providers::get_api_key(openai_key, Provider::OpenAI.api_key_env_var()) {
            Ok(key) => router.register(Provider::OpenAI, Arc::new(OpenAIProvider::new(key))),
            Err(_) => tracing::debug!("No OpenAI key configured"),
        }
        match recall_ai::providers::get_api_key(
            huggingface_key,
            Provider::HuggingFace.api_key_env_var(),
        ) {
            Ok(key) => router.register(
                Provider::HuggingFace,
                Arc::new(HuggingFaceProvider::new(key)),
            ),
            Err(_) => tracing::debug!("No Hugging Face token configured"),
        }

        router
    }

    pub fn has_provider(&self, provider: Provider) -> bool {
        self.services.contains_key(&provider)
    }

    /// Send `messages` to `model` through its provider's service
    pub async fn chat(
        &self,
        model: ModelId,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse> {
        let provider = model.provider();
        let service = self.services.get(&provider).ok_or_else(|| {
            recall_ai::Error::UnsupportedProvider(format!(
                "{} (no API key configured)",
                provider.name()
            ))
        })?;
        service.chat(messages, model.id(), options).await
    }
}
