//! Persistence of the durable conversation subset in a key-value store.
//!
//! Layout (one string per key):
//! - `chat_history`: JSON array of messages
//! - `chat_summary`: summary text
//! - `chat_summary_index`: watermark as a decimal integer
//! - `chat_schema_version`: layout version
//!
//! Reads degrade to empty/zero values and writes never fail past this
//! module; durability is best effort.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use recall_ai::Message;

use crate::conversation::DurableState;
use crate::error::StorageError;

pub const HISTORY_KEY: &str = "chat_history";
pub const SUMMARY_KEY: &str = "chat_summary";
pub const SUMMARY_INDEX_KEY: &str = "chat_summary_index";
pub const SCHEMA_VERSION_KEY: &str = "chat_schema_version";

/// Current persisted layout version
pub const SCHEMA_VERSION: u32 = 1;

/// Named string storage. No atomicity across keys is assumed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves the durable conversation state.
#[derive(Clone)]
pub struct ConversationStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ConversationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read the persisted conversation. Never fails: unreadable or
    /// malformed entries fall back to empty values.
    pub async fn load(&self) -> DurableState {
        if !self.schema_is_supported().await {
            return DurableState::default();
        }

        let messages = match self.read(HISTORY_KEY).await {
            Some(raw) if !raw.trim().is_empty() => {
                match serde_json::from_str::<Vec<Message>>(&raw) {
                    Ok(messages) => messages,
                    Err(e) => {
                        tracing::warn!("Malformed chat history, starting empty: {}", e);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let summary = self.read(SUMMARY_KEY).await.unwrap_or_default();

        let summarized_up_to = self
            .read(SUMMARY_INDEX_KEY)
            .await
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let mut durable = DurableState {
            messages,
            summary,
            summarized_up_to,
        };
        durable.heal();

        tracing::debug!(
            messages = durable.messages.len(),
            summarized_up_to = durable.summarized_up_to,
            has_summary = !durable.summary.is_empty(),
            "Loaded conversation"
        );
        durable
    }

    /// Persist the durable state, logging and swallowing any failure.
    pub async fn save(&self, state: &DurableState) {
        if let Err(e) = self.try_save(state).await {
            tracing::warn!("Failed to persist conversation: {}", e);
        }
    }

    /// Persist the durable state, reporting the first failure.
    ///
    /// The log is written before the watermark so a partial write leaves
    /// either a valid watermark or one that `load` heals.
    pub async fn try_save(&self, state: &DurableState) -> Result<(), StorageError> {
        let history = serde_json::to_string(&state.messages)?;
        self.kv.put_string(HISTORY_KEY, &history).await?;
        self.kv.put_string(SUMMARY_KEY, &state.summary).await?;
        self.kv
            .put_string(SUMMARY_INDEX_KEY, &state.summarized_up_to.to_string())
            .await?;
        self.kv
            .put_string(SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_string())
            .await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.kv.get_string(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    /// Missing version means data written before versioning; anything other
    /// than the current version is discarded.
    async fn schema_is_supported(&self) -> bool {
        match self.read(SCHEMA_VERSION_KEY).await {
            None => true,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(SCHEMA_VERSION) => true,
                _ => {
                    tracing::warn!(
                        version = %raw,
                        "Unsupported conversation schema version, starting empty"
                    );
                    false
                }
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use recall_ai::TokenUsage;

    /// Store whose reads or writes fail on demand.
    #[derive(Default)]
    pub(crate) struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_reads: std::sync::atomic::AtomicBool,
        pub fail_writes: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::read(key, "device unavailable"));
            }
            self.inner.get_string(key).await
        }

        async fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::write(key, "disk full"));
            }
            self.inner.put_string(key, value).await
        }
    }

    fn sample_state() -> DurableState {
        DurableState {
            messages: vec![
                Message::user("hello"),
                Message::assistant_with_usage("hi!", Some(TokenUsage::new(5, 2, 7))),
                Message::user("how are you?"),
            ],
            summary: "User greeted the assistant.".into(),
            summarized_up_to: 2,
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let kv = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(kv.clone());
        let state = sample_state();

        store.try_save(&state).await.unwrap();
        let fresh = ConversationStore::new(kv);
        assert_eq!(fresh.load().await, state);
    }

    #[tokio::test]
    async fn test_persisted_layout() {
        let kv = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(kv.clone());
        store.save(&sample_state()).await;

        let entries = kv.entries();
        assert_eq!(entries[SUMMARY_KEY], "User greeted the assistant.");
        assert_eq!(entries[SUMMARY_INDEX_KEY], "2");
        assert_eq!(entries[SCHEMA_VERSION_KEY], "1");
        let history: serde_json::Value = serde_json::from_str(&entries[HISTORY_KEY]).unwrap();
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[1]["usage"]["totalTokens"], 7);
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let store = ConversationStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load().await, DurableState::default());
    }

    #[tokio::test]
    async fn test_load_malformed_history_falls_back_to_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.put_string(HISTORY_KEY, "[{not json").await.unwrap();
        kv.put_string(SUMMARY_KEY, "kept").await.unwrap();
        kv.put_string(SUMMARY_INDEX_KEY, "0").await.unwrap();

        let loaded = ConversationStore::new(kv).load().await;
        assert!(loaded.messages.is_empty());
        assert_eq!(loaded.summary, "kept");
    }

    #[tokio::test]
    async fn test_load_bad_index_is_zero() {
        let kv = Arc::new(MemoryStore::new());
        kv.put_string(HISTORY_KEY, r#"[{"role":"user","content":"a"}]"#)
            .await
            .unwrap();
        kv.put_string(SUMMARY_INDEX_KEY, "one").await.unwrap();

        let loaded = ConversationStore::new(kv).load().await;
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.summarized_up_to, 0);
    }

    #[tokio::test]
    async fn test_load_heals_truncated_history() {
        let kv = Arc::new(MemoryStore::new());
        kv.put_string(HISTORY_KEY, r#"[{"role":"user","content":"a"}]"#)
            .await
            .unwrap();
        kv.put_string(SUMMARY_KEY, "refers to lost messages").await.unwrap();
        kv.put_string(SUMMARY_INDEX_KEY, "6").await.unwrap();

        let loaded = ConversationStore::new(kv).load().await;
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.summarized_up_to, 0);
        assert_eq!(loaded.summary, "");
    }

    #[tokio::test]
    async fn test_load_unknown_schema_resets() {
        let kv = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(kv.clone());
        store.save(&sample_state()).await;
        kv.put_string(SCHEMA_VERSION_KEY, "2").await.unwrap();

        assert_eq!(store.load().await, DurableState::default());
    }

    #[tokio::test]
    async fn test_load_read_failure_is_empty() {
        let kv = Arc::new(FlakyStore::default());
        let store = ConversationStore::new(kv.clone());
        store.save(&sample_state()).await;
        kv.fail_reads.store(true, std::sync::atomic::Ordering::SeqCst);

        assert_eq!(store.load().await, DurableState::default());
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let kv = Arc::new(FlakyStore::default());
        kv.fail_writes.store(true, std::sync::atomic::Ordering::SeqCst);
        let store = ConversationStore::new(kv.clone());

        store.save(&sample_state()).await;
        assert!(store.try_save(&sample_state()).await.is_err());
        assert!(kv.inner.entries().is_empty());
    }
}
