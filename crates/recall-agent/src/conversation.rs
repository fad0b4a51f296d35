//! Conversation state: messages, rolling summary, watermark, usage and flags.

use recall_ai::{Message, ModelId, TokenUsage};

use crate::usage::UsageAccumulator;

/// System prompt used when none is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and concise assistant.";

/// The persisted subset of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurableState {
    pub messages: Vec<Message>,
    pub summary: String,
    pub summarized_up_to: usize,
}

impl DurableState {
    /// Drop a watermark that points past the end of the log, together with
    /// the summary it belongs to. Returns `true` if anything was reset.
    pub fn heal(&mut self) -> bool {
        if self.summarized_up_to > self.messages.len() {
            tracing::warn!(
                summarized_up_to = self.summarized_up_to,
                messages = self.messages.len(),
                "Summary watermark beyond message log, discarding summary"
            );
            self.summarized_up_to = 0;
            self.summary.clear();
            return true;
        }
        false
    }
}

/// Conversation state owned by one agent.
///
/// Invariant: `summarized_up_to <= messages.len()`. `messages[..summarized_up_to]`
/// are folded into `summary` and are never sent to the model again.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// User-editable system prompt
    pub system_prompt: String,
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,
    /// Rolling summary; empty until the first compaction
    pub summary: String,
    /// Number of leading messages folded into `summary`
    pub summarized_up_to: usize,
    /// Model used for the next chat turn
    pub selected_model: ModelId,
    /// Last-reply and session usage
    pub usage: UsageAccumulator,
    /// A chat request is in flight
    pub is_loading: bool,
    /// A compaction is in flight
    pub is_compressing: bool,
    /// Bumped by every clear so in-flight compactions can detect it
    pub(crate) generation: u64,
}

/// Read-only copy handed to observers.
pub type ConversationSnapshot = ConversationState;

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, ModelId::default())
    }
}

impl ConversationState {
    pub fn new(system_prompt: impl Into<String>, selected_model: ModelId) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            summary: String::new(),
            summarized_up_to: 0,
            selected_model,
            usage: UsageAccumulator::default(),
            is_loading: false,
            is_compressing: false,
            generation: 0,
        }
    }

    /// Append a message. Persisting is the caller's job.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Messages not yet folded into the summary
    pub fn unsummarized(&self) -> &[Message] {
        let start = self.summarized_up_to.min(self.messages.len());
        &self.messages[start..]
    }

    pub fn unsummarized_count(&self) -> usize {
        self.messages.len().saturating_sub(self.summarized_up_to)
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty()
    }

    pub fn last_usage(&self) -> Option<TokenUsage> {
        self.usage.last()
    }

    pub fn total_usage(&self) -> TokenUsage {
        self.usage.total()
    }

    /// Copy of the persisted subset
    pub fn durable(&self) -> DurableState {
        DurableState {
            messages: self.messages.clone(),
            summary: self.summary.clone(),
            summarized_up_to: self.summarized_up_to,
        }
    }

    /// Replace the persisted subset, healing an out-of-range watermark
    pub fn restore(&mut self, mut durable: DurableState) {
        durable.heal();
        self.messages = durable.messages;
        self.summary = durable.summary;
        self.summarized_up_to = durable.summarized_up_to;
    }

    /// Reset messages, summary, watermark and usage
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.summary.clear();
        self.summarized_up_to = 0;
        self.usage.reset();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(n: usize) -> ConversationState {
        let mut state = ConversationState::default();
        for i in 0..n {
            state.append(Message::user(format!("m{}", i)));
        }
        state
    }

    #[test]
    fn test_defaults() {
        let state = ConversationState::default();
        assert_eq!(state.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(state.selected_model, ModelId::Gpt4o);
        assert!(state.messages.is_empty());
        assert!(!state.has_summary());
        assert!(state.total_usage().is_zero());
        assert!(state.last_usage().is_none());
    }

    #[test]
    fn test_unsummarized_tail() {
        let mut state = state_with(5);
        state.summarized_up_to = 3;
        assert_eq!(state.unsummarized_count(), 2);
        let tail: Vec<&str> = state.unsummarized().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
    }

    #[test]
    fn test_unsummarized_tolerates_watermark_past_end() {
        let mut state = state_with(2);
        state.summarized_up_to = 5;
        assert!(state.unsummarized().is_empty());
        assert_eq!(state.unsummarized_count(), 0);
    }

    #[test]
    fn test_restore_heals_watermark() {
        let mut state = ConversationState::default();
        state.restore(DurableState {
            messages: vec![Message::user("only one")],
            summary: "stale summary".into(),
            summarized_up_to: 4,
        });
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.summarized_up_to, 0);
        assert_eq!(state.summary, "");
    }

    #[test]
    fn test_restore_keeps_valid_watermark() {
        let mut state = ConversationState::default();
        let durable = DurableState {
            messages: vec![Message::user("a"), Message::assistant("b")],
            summary: "s".into(),
            summarized_up_to: 2,
        };
        state.restore(durable.clone());
        assert_eq!(state.durable(), durable);
    }

    #[test]
    fn test_clear_history_resets_everything_durable() {
        let mut state = state_with(4);
        state.summary = "summary".into();
        state.summarized_up_to = 2;
        state.usage.record_turn(TokenUsage::new(1, 2, 3));
        let generation = state.generation;

        state.clear_history();

        assert_eq!(state.durable(), DurableState::default());
        assert!(state.total_usage().is_zero());
        assert!(state.last_usage().is_none());
        assert_ne!(state.generation, generation);
    }
}
