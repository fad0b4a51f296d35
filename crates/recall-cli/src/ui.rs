//! Terminal output for the line-oriented chat loop

use recall_agent::{AgentEvent, CompactionOutcome, QueryOutcome};
use recall_ai::{ModelId, TokenUsage};
use std::io::IsTerminal;

const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn styled(code: &str, text: &str) -> String {
    if std::io::stderr().is_terminal() {
        format!("{}{}{}", code, text, RESET)
    } else {
        text.to_string()
    }
}

/// One-line notice for events that happen off the main turn, or `None`
/// for events the chat loop already reports itself.
pub fn describe_event(event: &AgentEvent) -> Option<String> {
    match event {
        AgentEvent::CompactionStart { from, to, .. } => {
            Some(format!("[Summarizing messages {}..{}]", from, to))
        }
        AgentEvent::CompactionEnd {
            summarized_up_to,
            usage,
        } => {
            let tokens = usage
                .map(|u| format!(", {} tokens", u.total_tokens))
                .unwrap_or_default();
            Some(format!(
                "[Summary updated: {} messages folded in{}]",
                summarized_up_to, tokens
            ))
        }
        AgentEvent::CompactionFailed { error } => {
            Some(format!("[Summary not updated: {}]", error))
        }
        _ => None,
    }
}

/// Print a background notice to stderr
pub fn print_notice(text: &str) {
    eprintln!("{}", styled(DIM, text));
}

/// Short usage footer shown after a reply
pub fn usage_footer(usage: &TokenUsage) -> String {
    format!(
        "[Tokens: {} in, {} out]",
        crate::commands::format_number(usage.prompt_tokens),
        crate::commands::format_number(usage.completion_tokens)
    )
}

/// Print the result of a query. `reply` is the assistant text for a
/// completed turn.
pub fn print_outcome(outcome: &QueryOutcome, reply: Option<&str>) {
    match outcome {
        QueryOutcome::Ignored => {}
        QueryOutcome::Completed { usage } => {
            if let Some(reply) = reply {
                println!("{}", reply);
            }
            if let Some(usage) = usage {
                eprintln!("{}", styled(DIM, &usage_footer(usage)));
            }
        }
        QueryOutcome::Failed { error } => {
            eprintln!("{}", styled(RED, &format!("Error: {}", error)));
        }
    }
}

/// Result line for `/compact`
pub fn describe_compaction(outcome: &CompactionOutcome) -> String {
    match outcome {
        CompactionOutcome::AlreadyRunning => "A summary is already being computed.".to_string(),
        CompactionOutcome::NothingToCompact => "Nothing to summarize yet.".to_string(),
        CompactionOutcome::Compacted { from, to } => {
            format!("Summarized messages {}..{}.", from, to)
        }
        CompactionOutcome::Failed(error) => format!("Summarization failed: {}", error),
        CompactionOutcome::Discarded => {
            "Conversation changed; summary discarded.".to_string()
        }
    }
}

/// Startup banner
pub fn banner(model: ModelId, messages: usize, summarized: usize) -> String {
    let mut text = format!("recall ({})", model.id());
    if messages > 0 {
        text.push_str(&format!(
            " resumed: {} messages, {} summarized",
            messages, summarized
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_agent::CompactionReason;

    #[test]
    fn test_compaction_notices() {
        let start = AgentEvent::CompactionStart {
            reason: CompactionReason::Threshold,
            from: 0,
            to: 2,
        };
        assert_eq!(describe_event(&start).unwrap(), "[Summarizing messages 0..2]");

        let end = AgentEvent::CompactionEnd {
            summarized_up_to: 4,
            usage: Some(TokenUsage::new(90, 10, 100)),
        };
        assert_eq!(
            describe_event(&end).unwrap(),
            "[Summary updated: 4 messages folded in, 100 tokens]"
        );
    }

    #[test]
    fn test_turn_events_are_not_notices() {
        assert!(describe_event(&AgentEvent::QueryStart).is_none());
        assert!(describe_event(&AgentEvent::TurnEnd { usage: None }).is_none());
    }

    #[test]
    fn test_describe_compaction() {
        assert_eq!(
            describe_compaction(&CompactionOutcome::Compacted { from: 2, to: 6 }),
            "Summarized messages 2..6."
        );
        assert!(describe_compaction(&CompactionOutcome::Failed("boom".into())).contains("boom"));
    }

    #[test]
    fn test_banner() {
        assert_eq!(banner(ModelId::Gpt4o, 0, 0), "recall (gpt-4o)");
        assert_eq!(
            banner(ModelId::Gpt4o, 8, 2),
            "recall (gpt-4o) resumed: 8 messages, 2 summarized"
        );
    }

    #[test]
    fn test_usage_footer() {
        assert_eq!(
            usage_footer(&TokenUsage::new(1_200, 30, 1_230)),
            "[Tokens: 1.2k in, 30 out]"
        );
    }
}
