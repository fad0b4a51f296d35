//! recall - terminal chat client with rolling conversation summaries

mod commands;
mod config;
mod storage;
mod ui;

use clap::Parser;
use recall_agent::{Agent, CompactionReason, ProviderRouter, QueryOutcome};
use recall_ai::{Provider, models};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, LinesStream};

use commands::CommandResult;

/// recall - chat with long-term memory
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat model id or name (default: gpt-4o)
    #[arg(short, long)]
    model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    system: Option<String>,

    /// Directory holding the conversation state
    #[arg(long)]
    data_dir: Option<String>,

    /// Run in non-interactive mode with a single query
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Clear the stored conversation before starting
    #[arg(long)]
    clear: bool,

    /// List available models
    #[arg(long)]
    models: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// How long to wait on exit for a background summary to be saved
const EXIT_COMPACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("recall=debug,recall_agent=debug,recall_ai=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let config = config::Config::load();
    let mut agent_config = config.agent_config();

    if args.models {
        println!(
            "{}",
            commands::ModelCommand::list_models_text(agent_config.model)
        );
        return Ok(());
    }

    if let Some(query) = args.model.as_deref() {
        agent_config.model = models::find_model(query)
            .ok_or_else(|| anyhow::anyhow!("Unknown model: {} (see --models)", query))?;
    }
    if let Some(system) = args.system {
        agent_config.system_prompt = system;
    }

    let router = ProviderRouter::from_keys(
        config.get_api_key(Provider::OpenAI),
        config.get_api_key(Provider::HuggingFace),
    );
    for provider in [agent_config.model.provider(), agent_config.compaction.model.provider()] {
        if !router.has_provider(provider) {
            eprintln!(
                "Warning: No API key for {}. Set {} or add it to {}",
                provider.name(),
                provider.api_key_env_var(),
                config::Config::config_path().display()
            );
        }
    }

    let data_dir = args
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir());
    let store = Arc::new(storage::FileStore::new(&data_dir));
    tracing::debug!("Conversation state at {}", store.path().display());

    let agent = Agent::new(agent_config, router, store).await;

    if args.clear {
        agent.clear_chat().await;
    }

    let notices = spawn_notice_printer(&agent);

    let result = if let Some(command) = args.command {
        run_command(&agent, &command).await
    } else {
        run_interactive(&agent).await
    };

    // Let an in-flight summary finish so it is persisted.
    if !agent
        .handle()
        .wait_for_compaction_timeout(EXIT_COMPACTION_TIMEOUT)
        .await
    {
        tracing::warn!("Exiting with a summary still in flight");
    }
    notices.abort();

    result
}

/// Print background events (summarization) as they happen
fn spawn_notice_printer(agent: &Agent) -> tokio::task::JoinHandle<()> {
    let mut events = BroadcastStream::new(agent.subscribe());
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            // A lagged receiver just skips what it missed.
            let Ok(event) = event else { continue };
            if let Some(text) = ui::describe_event(&event) {
                ui::print_notice(&text);
            }
        }
    })
}

fn last_reply(agent: &Agent) -> Option<String> {
    agent.snapshot().messages.last().map(|m| m.content.clone())
}

async fn run_command(agent: &Agent, query: &str) -> anyhow::Result<()> {
    let outcome = agent.send_query(query).await;
    ui::print_outcome(&outcome, last_reply(agent).as_deref());

    if let QueryOutcome::Failed { .. } = outcome {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_interactive(agent: &Agent) -> anyhow::Result<()> {
    use std::io::Write;

    // Show minimal startup info (only if TTY)
    if std::io::stderr().is_terminal() {
        let state = agent.snapshot();
        eprintln!(
            "{}",
            ui::banner(
                state.selected_model,
                state.messages.len(),
                state.summarized_up_to
            )
        );
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    let mut lines = LinesStream::new(tokio::io::BufReader::new(tokio::io::stdin()).lines());

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        // Input is only read once the previous query has returned.
        let Some(line) = lines.next().await else {
            // EOF
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input, &agent.snapshot()) {
            match result {
                CommandResult::Clear => {
                    agent.clear_chat().await;
                    println!("Cleared conversation.");
                }
                CommandResult::Exit => break,
                CommandResult::Message(msg) => println!("{}", msg),
                CommandResult::ChangeModel(model) => {
                    agent.set_model(model);
                    println!("Switched to: {} ({})", model.id(), model.provider().name());
                }
                CommandResult::SetSystemPrompt(prompt) => {
                    agent.update_system_prompt(prompt);
                    println!("System prompt updated.");
                }
                CommandResult::Compact => {
                    let outcome = agent.compact(CompactionReason::Manual).await;
                    println!("{}", ui::describe_compaction(&outcome));
                }
                CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            continue;
        }

        let outcome = agent.send_query(input).await;
        ui::print_outcome(&outcome, last_reply(agent).as_deref());
    }

    Ok(())
}
