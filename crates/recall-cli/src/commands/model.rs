//! /model command - show and switch models

use super::CommandResult;
use recall_ai::{ModelId, models};

pub struct ModelCommand;

impl ModelCommand {
    /// Show the current model if no args, or switch to the matching model
    pub fn execute(args: &str, current: ModelId) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(format!(
                "Current model: {} ({}, {})\nUse /models to list available models",
                current.display_name(),
                current.id(),
                current.provider().name()
            ));
        }

        match find_model(args) {
            Some(model) => CommandResult::ChangeModel(model),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /models to list available models",
                args
            )),
        }
    }

    /// List models grouped by provider
    pub fn list_models_text(current: ModelId) -> String {
        let mut output = String::from("Available models:\n");

        for provider in models::get_providers() {
            output.push_str(&format!("\n{}:\n", provider.name()));
            for model in models::get_models(provider) {
                let marker = if model == current { " *" } else { "" };
                output.push_str(&format!(
                    "  {:<40} {}{}\n",
                    model.id(),
                    model.display_name(),
                    marker
                ));
            }
        }

        output.push_str("\nSwitch with: /model <name>");
        output
    }
}

/// Exact id or display name first, then a partial match on either
fn find_model(query: &str) -> Option<ModelId> {
    if let Some(model) = models::find_model(query) {
        return Some(model);
    }

    let query_lower = query.to_lowercase();
    models::get_all_models().into_iter().find(|m| {
        m.id().to_lowercase().contains(&query_lower)
            || m.display_name().to_lowercase().contains(&query_lower)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_match() {
        assert_eq!(find_model("qwen"), Some(ModelId::Qwen25Coder32b));
        assert_eq!(find_model("llama"), Some(ModelId::Llama32_1b));
        // Exact match wins over the earlier partial "gpt-4o"
        assert_eq!(find_model("gpt-4o-mini"), Some(ModelId::Gpt4oMini));
        assert_eq!(find_model("claude"), None);
    }

    #[test]
    fn test_list_marks_current() {
        let text = ModelCommand::list_models_text(ModelId::SmolLm2);
        let marked: Vec<&str> = text.lines().filter(|l| l.ends_with(" *")).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("SmolLM2"));
    }

    #[test]
    fn test_no_match_message() {
        assert!(matches!(
            ModelCommand::execute("claude", ModelId::Gpt4o),
            CommandResult::Message(m) if m.contains("No model found")
        ));
    }
}
