//! Agent state management and execution

use parking_lot::Mutex;
use std::sync::Arc;

use recall_ai::{ChatOptions, Message, ModelId, TokenUsage};
use tokio::sync::broadcast;

use crate::{
    compaction::{self, CompactionConfig, CompactionOutcome, CompactionPlan, CompactionReason},
    context,
    conversation::{ConversationSnapshot, ConversationState, DEFAULT_SYSTEM_PROMPT},
    events::AgentEvent,
    handle::AgentHandle,
    store::{ConversationStore, KeyValueStore},
    transport::ProviderRouter,
};

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Initial system prompt
    pub system_prompt: String,
    /// Initial chat model
    pub model: ModelId,
    /// Maximum tokens per chat reply
    pub max_tokens: Option<u32>,
    /// Context compaction configuration
    pub compaction: CompactionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: ModelId::default(),
            max_tokens: None,
            compaction: CompactionConfig::default(),
        }
    }
}

/// Result of [`Agent::send_query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Blank input; nothing was recorded
    Ignored,
    /// The model replied and the reply was appended
    Completed { usage: Option<TokenUsage> },
    /// The request failed; an error turn was appended instead
    Failed { error: String },
}

struct AgentInner {
    config: AgentConfig,
    handle: AgentHandle,
    store: ConversationStore,
    router: ProviderRouter,
    event_tx: broadcast::Sender<AgentEvent>,
    /// Serializes saves so an older snapshot never lands after a newer one
    persist_lock: tokio::sync::Mutex<()>,
}

/// The conversation orchestrator.
///
/// Cheap to clone; clones share one conversation. All mutation goes
/// through its methods, and callers are expected not to overlap
/// `send_query` calls (gate input on `is_loading`).
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Create an agent and restore its history from `kv`
    pub async fn new(
        config: AgentConfig,
        router: ProviderRouter,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        let store = ConversationStore::new(kv);
        let mut state = ConversationState::new(config.system_prompt.clone(), config.model);
        state.restore(store.load().await);

        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(AgentInner {
                handle: AgentHandle::new(state),
                config,
                store,
                router,
                event_tx,
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Subscribe to agent events
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.inner.handle.snapshot()
    }

    /// Get the agent config
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Get a cloneable handle for observing the agent
    pub fn handle(&self) -> AgentHandle {
        self.inner.handle.clone()
    }

    /// Whether a chat request is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.handle.is_loading()
    }

    /// Whether a compaction is in flight
    pub fn is_compressing(&self) -> bool {
        self.inner.handle.is_compressing()
    }

    /// Wait until no compaction is running
    pub async fn wait_for_compaction(&self) {
        self.inner.handle.wait_for_compaction().await;
    }

    /// Replace the system prompt
    pub fn update_system_prompt(&self, prompt: impl Into<String>) {
        self.state().system_prompt = prompt.into();
        self.emit(AgentEvent::SystemPromptChanged);
    }

    /// Select the model for subsequent chat turns
    pub fn set_model(&self, model: ModelId) {
        self.state().selected_model = model;
        self.emit(AgentEvent::ModelChanged { model });
    }

    /// Reset messages, summary, watermark and usage, and persist the reset
    pub async fn clear_chat(&self) {
        self.state().clear_history();
        tracing::debug!("Conversation cleared");
        self.emit(AgentEvent::Cleared);
        self.persist().await;
    }

    /// Send a user query and record the reply.
    ///
    /// Failures never propagate: they are recorded as an assistant turn
    /// starting with `Error:`. After a successful turn, compaction may be
    /// started in the background; this method does not wait for it.
    pub async fn send_query(&self, text: &str) -> QueryOutcome {
        if text.trim().is_empty() {
            return QueryOutcome::Ignored;
        }

        let user_message = Message::user(text);
        let (model, context) = {
            let mut state = self.state();
            state.append(user_message.clone());
            state.is_loading = true;
            state.usage.begin_turn();
            (state.selected_model, context::assemble(&state))
        };
        let loading = LoadingGuard {
            state: &self.inner.handle.state,
        };
        self.emit(AgentEvent::MessageAppended {
            message: user_message,
        });
        self.emit(AgentEvent::QueryStart);
        self.persist().await;

        tracing::debug!(
            model = model.id(),
            context_messages = context.len(),
            "Sending query"
        );

        let options = ChatOptions {
            temperature: None,
            max_tokens: self.inner.config.max_tokens,
        };
        let outcome = match self.inner.router.chat(model, &context, &options).await {
            Ok(response) => {
                let usage = response.usage;
                let reply = Message::assistant_with_usage(response.content, usage);
                {
                    let mut state = self.state();
                    state.append(reply.clone());
                    if let Some(usage) = usage {
                        state.usage.record_turn(usage);
                    }
                }
                self.emit(AgentEvent::MessageAppended { message: reply });
                self.emit(AgentEvent::TurnEnd { usage });
                QueryOutcome::Completed { usage }
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let error = e.to_string();
                let reply = Message::assistant(format!("Error: {}", error));
                self.state().append(reply.clone());
                self.emit(AgentEvent::MessageAppended { message: reply });
                self.emit(AgentEvent::TurnFailed {
                    error: error.clone(),
                });
                QueryOutcome::Failed { error }
            }
        };

        self.persist().await;
        drop(loading);

        if matches!(outcome, QueryOutcome::Completed { .. }) {
            self.maybe_spawn_compaction();
        }
        outcome
    }

    /// Run compaction now and wait for it.
    ///
    /// A no-op if another compaction is in flight or nothing outside the
    /// kept tail is left to fold in. Model failures are logged and leave
    /// the state unchanged.
    pub async fn compact(&self, reason: CompactionReason) -> CompactionOutcome {
        match self.reserve_compaction(false) {
            Ok(reservation) => self.run_compaction(reason, reservation).await,
            Err(outcome) => outcome,
        }
    }

    /// Fix the range to compact and mark compaction as running, in one
    /// critical section. With `only_if_due`, the automatic trigger policy
    /// must also hold.
    fn reserve_compaction(&self, only_if_due: bool) -> Result<Reservation, CompactionOutcome> {
        let config = &self.inner.config.compaction;
        let plan = {
            let mut state = self.state();
            if state.is_compressing {
                return Err(CompactionOutcome::AlreadyRunning);
            }
            if only_if_due && !compaction::should_compact(&state, config) {
                return Err(CompactionOutcome::NothingToCompact);
            }
            let plan = compaction::plan(&state, config).ok_or(CompactionOutcome::NothingToCompact)?;
            state.is_compressing = true;
            plan
        };
        Ok(Reservation {
            plan,
            _compressing: CompressingGuard {
                handle: self.inner.handle.clone(),
            },
        })
    }

    async fn run_compaction(
        &self,
        reason: CompactionReason,
        reservation: Reservation,
    ) -> CompactionOutcome {
        let config = &self.inner.config.compaction;
        let plan = &reservation.plan;

        tracing::debug!(?reason, from = plan.from, to = plan.to, "Compacting conversation");
        self.emit(AgentEvent::CompactionStart {
            reason,
            from: plan.from,
            to: plan.to,
        });

        let outcome = match compaction::summarize(plan, config, &self.inner.router).await {
            Ok(response) => {
                let usage = response.usage;
                let outcome = compaction::apply(&mut self.state(), plan, response);
                match outcome {
                    CompactionOutcome::Compacted { to, .. } => {
                        self.emit(AgentEvent::CompactionEnd {
                            summarized_up_to: to,
                            usage,
                        });
                    }
                    _ => {
                        tracing::debug!("Conversation changed during compaction, result dropped");
                        self.emit(AgentEvent::CompactionFailed {
                            error: "conversation changed during compaction".to_string(),
                        });
                    }
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("Compaction failed: {}", e);
                self.emit(AgentEvent::CompactionFailed {
                    error: e.to_string(),
                });
                CompactionOutcome::Failed(e.to_string())
            }
        };

        self.persist().await;
        // Waiters are woken only after the result is saved.
        drop(reservation);
        outcome
    }

    /// Start a background compaction if the trigger policy holds.
    ///
    /// `is_compressing` is already set when this returns, so observers can
    /// wait on the handle straight away.
    fn maybe_spawn_compaction(&self) {
        let Ok(reservation) = self.reserve_compaction(true) else {
            return;
        };
        let agent = self.clone();
        tokio::spawn(async move {
            let outcome = agent
                .run_compaction(CompactionReason::Threshold, reservation)
                .await;
            tracing::debug!(?outcome, "Background compaction finished");
        });
    }

    async fn persist(&self) {
        let _guard = self.inner.persist_lock.lock().await;
        let durable = self.state().durable();
        self.inner.store.save(&durable).await;
    }

    fn state(&self) -> parking_lot::MutexGuard<'_, ConversationState> {
        self.inner.handle.state.lock()
    }

    fn emit(&self, event: AgentEvent) {
        let _ = self.inner.event_tx.send(event);
    }
}

/// Clears `is_loading` however the query ends, including cancellation.
struct LoadingGuard<'a> {
    state: &'a Mutex<ConversationState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().is_loading = false;
    }
}

/// A compaction range taken under the state lock, owning the running flag.
struct Reservation {
    plan: CompactionPlan,
    _compressing: CompressingGuard,
}

/// Clears `is_compressing` and wakes waiters however compaction ends.
struct CompressingGuard {
    handle: AgentHandle,
}

impl Drop for CompressingGuard {
    fn drop(&mut self) {
        self.handle.state.lock().is_compressing = false;
        self.handle.notify_compaction_idle();
    }
}
