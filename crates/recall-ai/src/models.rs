//! Model registry with public lookup API.

use crate::{ModelId, Provider};

/// Every model the client knows how to dispatch.
const MODEL_ENTRIES: &[ModelId] = &[
    ModelId::Gpt4o,
    ModelId::Gpt4oMini,
    ModelId::Llama32_1b,
    ModelId::Qwen25Coder32b,
    ModelId::SmolLm2,
];

/// Look up a model by its provider-side ID.
pub fn get_model_by_id(id: &str) -> Option<ModelId> {
    MODEL_ENTRIES.iter().copied().find(|m| m.id() == id)
}

/// Look up a model by ID, falling back to a case-insensitive match on the
/// ID or display name.
pub fn find_model(query: &str) -> Option<ModelId> {
    let query = query.trim();
    get_model_by_id(query).or_else(|| {
        MODEL_ENTRIES.iter().copied().find(|m| {
            m.id().eq_ignore_ascii_case(query) || m.display_name().eq_ignore_ascii_case(query)
        })
    })
}

/// Get all models for a specific provider.
pub fn get_models(provider: Provider) -> Vec<ModelId> {
    MODEL_ENTRIES
        .iter()
        .copied()
        .filter(|m| m.provider() == provider)
        .collect()
}

/// Get all registered models.
pub fn get_all_models() -> Vec<ModelId> {
    MODEL_ENTRIES.to_vec()
}

/// Get all providers that have at least one registered model.
pub fn get_providers() -> Vec<Provider> {
    let mut providers = Vec::new();
    for entry in MODEL_ENTRIES {
        let p = entry.provider();
        if !providers.contains(&p) {
            providers.push(p);
        }
    }
    providers
}
