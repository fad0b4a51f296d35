//! Configuration file support

use recall_agent::{AgentConfig, CompactionConfig, DEFAULT_SYSTEM_PROMPT};
use recall_ai::{ModelId, Provider, models};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for recall
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default chat model id
    pub model: Option<String>,
    /// System prompt for new sessions
    pub system_prompt: Option<String>,
    /// Where the conversation is stored
    pub data_dir: Option<String>,
    /// Background summarization settings
    pub compaction: CompactionSettings,
    /// API keys (alternative to environment variables)
    pub api_keys: ApiKeys,
}

/// Compaction settings; unset fields keep the library defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionSettings {
    pub enabled: Option<bool>,
    pub compress_threshold: Option<usize>,
    pub keep_last: Option<usize>,
    /// Model id used for summarization
    pub model: Option<String>,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub huggingface: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recall")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RECALL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(ModelId::default().id().to_string()),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            data_dir: None,
            compaction: CompactionSettings {
                enabled: Some(true),
                ..Default::default()
            },
            api_keys: ApiKeys::default(),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key for a provider from the config file.
    /// Environment variables are consulted later, when the router is built.
    pub fn get_api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAI => self.api_keys.openai.as_deref(),
            Provider::HuggingFace => self.api_keys.huggingface.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Directory holding `state.json`
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("recall"),
        }
    }

    /// Build the agent configuration, warning about unknown model ids
    pub fn agent_config(&self) -> AgentConfig {
        let defaults = CompactionConfig::default();
        let settings = &self.compaction;

        AgentConfig {
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            model: resolve_model(self.model.as_deref(), ModelId::default()),
            compaction: CompactionConfig {
                enabled: settings.enabled.unwrap_or(defaults.enabled),
                compress_threshold: settings
                    .compress_threshold
                    .unwrap_or(defaults.compress_threshold),
                keep_last: settings.keep_last.unwrap_or(defaults.keep_last),
                model: resolve_model(settings.model.as_deref(), defaults.model),
                ..defaults
            },
            ..Default::default()
        }
    }
}

/// Look up a model id or display name, falling back to `fallback`
pub fn resolve_model(query: Option<&str>, fallback: ModelId) -> ModelId {
    let Some(query) = query else {
        return fallback;
    };
    models::find_model(query).unwrap_or_else(|| {
        eprintln!(
            "Warning: Unknown model '{}', using {}",
            query,
            fallback.id()
        );
        fallback
    })
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# recall configuration file
# Place at ~/.config/recall/config.toml (Linux) or set RECALL_CONFIG_PATH

# Chat model (see `recall --models`)
model = "gpt-4o"

# System prompt for the assistant
system_prompt = "You are a helpful and concise assistant."

# Where the conversation is stored (default: platform data dir)
# data_dir = "~/.local/share/recall"

[compaction]
# Fold older turns into a running summary in the background
enabled = true
# Summarize once more than this many messages are un-summarized
compress_threshold = 5
# Most recent messages that are always sent verbatim
keep_last = 6
# Model used for summarization
model = "gpt-4o"

# API keys (optional - can also use OPENAI_API_KEY and HF_TOKEN)
[api_keys]
# openai = "sk-..."
# huggingface = "hf_..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.compaction.compress_threshold, Some(5));
        assert_eq!(config.compaction.keep_last, Some(6));
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_empty_config_uses_library_defaults() {
        let config = Config::parse("").unwrap();
        let agent = config.agent_config();
        let defaults = CompactionConfig::default();

        assert_eq!(agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(agent.model, ModelId::Gpt4o);
        assert_eq!(agent.compaction.compress_threshold, defaults.compress_threshold);
        assert_eq!(agent.compaction.keep_last, defaults.keep_last);
        assert!(agent.compaction.enabled);
    }

    #[test]
    fn test_agent_config_from_file() {
        let config = Config::parse(
            r#"
model = "HuggingFaceTB/SmolLM2-1.7B-Instruct"
system_prompt = "Be brief."

[compaction]
enabled = false
keep_last = 4
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        let agent = config.agent_config();

        assert_eq!(agent.model, ModelId::SmolLm2);
        assert_eq!(agent.system_prompt, "Be brief.");
        assert!(!agent.compaction.enabled);
        assert_eq!(agent.compaction.keep_last, 4);
        assert_eq!(agent.compaction.compress_threshold, 5);
        assert_eq!(agent.compaction.model, ModelId::Gpt4oMini);
    }

    #[test]
    fn test_unknown_model_falls_back() {
        assert_eq!(
            resolve_model(Some("not-a-model"), ModelId::Gpt4o),
            ModelId::Gpt4o
        );
        assert_eq!(resolve_model(None, ModelId::SmolLm2), ModelId::SmolLm2);
        assert_eq!(
            resolve_model(Some("GPT-4o mini"), ModelId::Gpt4o),
            ModelId::Gpt4oMini
        );
    }

    #[test]
    fn test_api_keys_from_config() {
        let config = Config::parse(
            r#"
[api_keys]
openai = "sk-test"
huggingface = "  "
"#,
        )
        .unwrap();
        assert_eq!(config.get_api_key(Provider::OpenAI), Some("sk-test"));
        assert_eq!(config.get_api_key(Provider::HuggingFace), None);
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(Config::parse("model = [").is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some("/tmp/recall-data".into()),
            ..Default::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/recall-data"));
    }
}
