//! Agent event types

use recall_ai::{Message, ModelId, TokenUsage};
use serde::{Deserialize, Serialize};

use crate::compaction::CompactionReason;

/// Events emitted as the conversation changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A query was accepted and the request is about to be sent
    QueryStart,

    /// A message was appended to the conversation
    MessageAppended { message: Message },

    /// The model replied
    TurnEnd { usage: Option<TokenUsage> },

    /// The request failed; an error turn was appended
    TurnFailed { error: String },

    /// Compaction of `messages[from..to]` started
    CompactionStart {
        reason: CompactionReason,
        from: usize,
        to: usize,
    },

    /// Compaction finished and the watermark moved
    CompactionEnd {
        summarized_up_to: usize,
        usage: Option<TokenUsage>,
    },

    /// Compaction failed or its result was dropped
    CompactionFailed { error: String },

    /// The system prompt was replaced
    SystemPromptChanged,

    /// The chat model was changed
    ModelChanged { model: ModelId },

    /// The conversation was cleared
    Cleared,
}

impl AgentEvent {
    /// Check if this event ends a query
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::TurnEnd { .. } | AgentEvent::TurnFailed { .. })
    }
}
