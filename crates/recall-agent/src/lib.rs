//! recall-agent: conversation runtime with rolling-summary memory
//!
//! This crate owns the conversation state, assembles the context sent to the
//! model, folds older turns into a running summary in the background, and
//! persists everything through a key-value store.

pub mod agent;
pub mod compaction;
pub mod context;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod store;
pub mod transport;
pub mod usage;

pub use agent::{Agent, AgentConfig, QueryOutcome};
pub use compaction::{CompactionConfig, CompactionOutcome, CompactionReason};
pub use conversation::{ConversationSnapshot, ConversationState, DEFAULT_SYSTEM_PROMPT, DurableState};
pub use error::{Error, StorageError};
pub use events::AgentEvent;
pub use handle::AgentHandle;
pub use store::{ConversationStore, KeyValueStore, MemoryStore};
pub use transport::ProviderRouter;
pub use usage::UsageAccumulator;
