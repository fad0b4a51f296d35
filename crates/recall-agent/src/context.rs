//! Builds the message list sent to the model for a chat turn.

use recall_ai::Message;

use crate::conversation::ConversationState;

/// Label separating the system prompt from the rolling summary
pub const SUMMARY_LABEL: &str = "[CONTEXT SUMMARY]:";

/// System prompt with the summary block appended when one exists
pub fn system_content(system_prompt: &str, summary: &str) -> String {
    if summary.is_empty() {
        system_prompt.to_string()
    } else {
        format!("{}\n\n{}\n{}", system_prompt, SUMMARY_LABEL, summary)
    }
}

/// Assemble the outbound context: one system message followed by every
/// message not yet folded into the summary, in conversation order.
pub fn assemble(state: &ConversationState) -> Vec<Message> {
    let tail = state.unsummarized();
    let mut context = Vec::with_capacity(tail.len() + 1);
    context.push(Message::system(system_content(
        &state.system_prompt,
        &state.summary,
    )));
    context.extend(tail.iter().cloned());
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_ai::Role;

    fn conversation(n: usize) -> ConversationState {
        let mut state = ConversationState::new("Be terse.", Default::default());
        for i in 0..n {
            if i % 2 == 0 {
                state.append(Message::user(format!("q{}", i)));
            } else {
                state.append(Message::assistant(format!("a{}", i)));
            }
        }
        state
    }

    #[test]
    fn test_no_summary_sends_prompt_verbatim() {
        let state = conversation(2);
        let context = assemble(&state);
        assert_eq!(context.len(), 3);
        assert_eq!(context[0], Message::system("Be terse."));
        assert_eq!(context[1].content, "q0");
        assert_eq!(context[2].role, Role::Assistant);
    }

    #[test]
    fn test_summary_block_and_tail_only() {
        let mut state = conversation(6);
        state.summary = "Earlier: greetings.".into();
        state.summarized_up_to = 4;

        let context = assemble(&state);
        assert_eq!(
            context[0].content,
            "Be terse.\n\n[CONTEXT SUMMARY]:\nEarlier: greetings."
        );
        let rest: Vec<&str> = context[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(rest, vec!["q4", "a5"]);
    }

    #[test]
    fn test_fully_summarized_sends_only_system() {
        let mut state = conversation(4);
        state.summary = "all of it".into();
        state.summarized_up_to = 4;
        assert_eq!(assemble(&state).len(), 1);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let mut state = conversation(5);
        state.summary = "s".into();
        state.summarized_up_to = 1;
        assert_eq!(assemble(&state), assemble(&state));
    }

    #[test]
    fn test_empty_conversation() {
        let state = ConversationState::new("", Default::default());
        assert_eq!(assemble(&state), vec![Message::system("")]);
    }
}
