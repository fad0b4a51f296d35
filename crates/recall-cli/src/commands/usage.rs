//! /usage and /summary commands - show token usage and memory state

use super::CommandResult;
use recall_agent::ConversationSnapshot;
use recall_ai::TokenUsage;

pub struct UsageCommand;

impl UsageCommand {
    pub fn execute(state: &ConversationSnapshot) -> CommandResult {
        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!(
            "Model:      {} ({})\n",
            state.selected_model.id(),
            state.selected_model.provider().name()
        ));
        output.push_str(&format!(
            "Messages:   {} total, {} summarized\n",
            state.messages.len(),
            state.summarized_up_to
        ));
        output.push('\n');

        output.push_str("Last turn:\n");
        match state.last_usage() {
            Some(usage) => push_usage(&mut output, &usage),
            None => output.push_str("  (none)\n"),
        }

        output.push_str("Session total (incl. summarization):\n");
        push_usage(&mut output, &state.total_usage());

        CommandResult::Message(output.trim_end().to_string())
    }
}

pub struct SummaryCommand;

impl SummaryCommand {
    pub fn execute(state: &ConversationSnapshot) -> CommandResult {
        if !state.has_summary() {
            return CommandResult::Message("No summary yet.".to_string());
        }
        CommandResult::Message(format!(
            "Summary of the first {} messages:\n{}",
            state.summarized_up_to, state.summary
        ))
    }
}

fn push_usage(output: &mut String, usage: &TokenUsage) {
    output.push_str(&format!(
        "  Prompt:      {:>8}\n",
        format_number(usage.prompt_tokens)
    ));
    output.push_str(&format!(
        "  Completion:  {:>8}\n",
        format_number(usage.completion_tokens)
    ));
    output.push_str(&format!(
        "  Total:       {:>8}\n",
        format_number(usage.total_tokens)
    ));
}

pub(crate) fn format_number(n: u32) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
