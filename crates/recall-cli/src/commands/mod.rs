//! Slash commands for interactive mode

mod model;
mod usage;

pub use model::ModelCommand;
pub use usage::{SummaryCommand, UsageCommand};
pub(crate) use usage::format_number;

use recall_agent::ConversationSnapshot;
use recall_ai::ModelId;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Change the chat model
    ChangeModel(ModelId),
    /// Replace the system prompt
    SetSystemPrompt(String),
    /// Summarize older turns now
    Compact,
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command.
///
/// Returns `None` if `input` is not a command.
pub fn execute_command(input: &str, state: &ConversationSnapshot) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "model" | "m" => ModelCommand::execute(args, state.selected_model),

        "models" => CommandResult::Message(ModelCommand::list_models_text(state.selected_model)),

        "system" => {
            if args.is_empty() {
                CommandResult::Message(format!("System prompt:\n{}", state.system_prompt))
            } else {
                CommandResult::SetSystemPrompt(args.to_string())
            }
        }

        "summary" => SummaryCommand::execute(state),

        "usage" | "u" => UsageCommand::execute(state),

        "compact" => CommandResult::Compact,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /model, /m [name]    Show the current model or switch to another
  /models              List available models
  /system [text]       Show or replace the system prompt
  /summary             Show the running summary of older messages
  /usage, /u           Show token usage
  /compact             Summarize older messages now
  /clear, /c           Clear conversation history and summary
  /quit, /exit, /q     Exit recall

Examples:
  /model gpt-4o-mini   Switch to GPT-4o mini
  /system Answer in French.
  /clear               Start fresh conversation"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_agent::ConversationState;

    fn state() -> ConversationSnapshot {
        ConversationState::new("Be nice.", ModelId::Gpt4o)
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(execute_command("hello /world", &state()), None);
    }

    #[test]
    fn test_basic_commands() {
        let s = state();
        assert_eq!(execute_command("/clear", &s), Some(CommandResult::Clear));
        assert_eq!(execute_command("  /QUIT ", &s), Some(CommandResult::Exit));
        assert_eq!(execute_command("/compact", &s), Some(CommandResult::Compact));
        assert_eq!(
            execute_command("/frobnicate now", &s),
            Some(CommandResult::Unknown("frobnicate".into()))
        );
        assert!(matches!(
            execute_command("/help", &s),
            Some(CommandResult::Message(m)) if m.contains("/summary")
        ));
    }

    #[test]
    fn test_system_prompt() {
        let s = state();
        assert_eq!(
            execute_command("/system   Answer in French. ", &s),
            Some(CommandResult::SetSystemPrompt("Answer in French.".into()))
        );
        assert!(matches!(
            execute_command("/system", &s),
            Some(CommandResult::Message(m)) if m.contains("Be nice.")
        ));
    }

    #[test]
    fn test_model_switch() {
        let s = state();
        assert_eq!(
            execute_command("/model SmolLM2 1.7B", &s),
            Some(CommandResult::ChangeModel(ModelId::SmolLm2))
        );
        assert!(matches!(
            execute_command("/models", &s),
            Some(CommandResult::Message(m)) if m.contains("Hugging Face")
        ));
    }
}
