//! Rolling-summary compaction for long conversations
//!
//! Once the un-summarized tail grows past a threshold, the older part of it
//! (everything except the most recent `keep_last` messages) is folded into
//! the running summary by a single model call, and the watermark moves
//! forward past it.

use recall_ai::{ChatOptions, ChatResponse, Message, ModelId};

use crate::conversation::ConversationState;
use crate::transport::ProviderRouter;

/// Configuration for context compaction
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Whether compaction triggers automatically after a turn
    pub enabled: bool,
    /// Compact once more than this many messages are un-summarized
    pub compress_threshold: usize,
    /// Most recent messages that are never compacted
    pub keep_last: usize,
    /// Model used for summarization, independent of the chat model
    pub model: ModelId,
    /// Sampling temperature for summarization
    pub temperature: Option<f32>,
    /// Cap on the summary length in tokens
    pub max_tokens: Option<u32>,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            compress_threshold: 5,
            keep_last: 6,
            model: ModelId::Gpt4o,
            temperature: Some(0.0),
            max_tokens: None,
        }
    }
}

impl CompactionConfig {
    fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Reason for compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionReason {
    /// Un-summarized tail exceeded the threshold after a turn
    Threshold,
    /// Requested explicitly
    Manual,
}

/// What a compaction run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Another compaction was in flight; nothing was touched
    AlreadyRunning,
    /// Everything outside the kept tail is already summarized
    NothingToCompact,
    /// `messages[from..to]` were folded into the summary
    Compacted { from: usize, to: usize },
    /// The model call failed; state is unchanged
    Failed(String),
    /// The conversation changed underneath the run and the result was dropped
    Discarded,
}

/// A closed range of messages to fold in, fixed when the run starts.
#[derive(Debug, Clone)]
pub struct CompactionPlan {
    /// First message to fold in (the current watermark)
    pub from: usize,
    /// End of the range, exclusive; the new watermark on success
    pub to: usize,
    /// Summary the new one replaces
    pub previous_summary: String,
    /// Rendered `role: content` lines of the range
    pub transcript: String,
    pub(crate) generation: u64,
}

/// Whether the automatic trigger should fire for this state
pub fn should_compact(state: &ConversationState, config: &CompactionConfig) -> bool {
    config.enabled && state.unsummarized_count() > config.compress_threshold
}

/// Fix the range to compact, or `None` if nothing new lies outside the
/// kept tail.
pub fn plan(state: &ConversationState, config: &CompactionConfig) -> Option<CompactionPlan> {
    let end = state.messages.len().checked_sub(config.keep_last)?;
    if end <= state.summarized_up_to {
        return None;
    }
    let from = state.summarized_up_to;
    Some(CompactionPlan {
        from,
        to: end,
        previous_summary: state.summary.clone(),
        transcript: render_transcript(&state.messages[from..end]),
        generation: state.generation,
    })
}

/// Render messages as one `role: content` line each.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Summarization Prompt ---

const NO_PREVIOUS_SUMMARY: &str = "(none)";

const SUMMARIZATION_PROMPT: &str = "\
You maintain a running summary of a conversation between a user and an assistant. \
Update the summary so it also covers the new messages below.

Keep every fact, name, number, preference, decision and open question needed to continue \
the conversation. Drop greetings, filler and repetition. Be as terse as possible: short \
phrases, no preamble, no commentary. Reply with the updated summary only.

<previous-summary>
{previous_summary}
</previous-summary>

<new-messages>
{conversation}
</new-messages>";

/// Build the single-turn summarization prompt
pub fn build_prompt(previous_summary: &str, transcript: &str) -> String {
    let previous = if previous_summary.trim().is_empty() {
        NO_PREVIOUS_SUMMARY
    } else {
        previous_summary
    };
    SUMMARIZATION_PROMPT
        .replace("{previous_summary}", previous)
        .replace("{conversation}", transcript)
}

/// Ask the summarization model for the updated summary.
///
/// The request carries only the prompt, no system message or history.
pub async fn summarize(
    plan: &CompactionPlan,
    config: &CompactionConfig,
    router: &ProviderRouter,
) -> crate::error::Result<ChatResponse> {
    let prompt = build_prompt(&plan.previous_summary, &plan.transcript);
    let response = router
        .chat(config.model, &[Message::user(prompt)], &config.chat_options())
        .await?;

    if response.content.trim().is_empty() {
        return Err(crate::error::Error::Compaction(
            "Summarization model returned empty response".to_string(),
        ));
    }
    Ok(response)
}

/// Apply a successful summarization to the state.
///
/// The result is dropped if the conversation was cleared since `plan` was
/// taken, or if the watermark would not move forward within bounds.
pub fn apply(
    state: &mut ConversationState,
    plan: &CompactionPlan,
    response: ChatResponse,
) -> CompactionOutcome {
    if state.generation != plan.generation
        || plan.to > state.messages.len()
        || plan.to <= state.summarized_up_to
    {
        return CompactionOutcome::Discarded;
    }

    state.summary = response.content.trim().to_string();
    state.summarized_up_to = plan.to;
    if let Some(usage) = response.usage {
        state.usage.record_background(usage);
    }

    CompactionOutcome::Compacted {
        from: plan.from,
        to: plan.to,
    }
}
