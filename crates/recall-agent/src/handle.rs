//! A cloneable read-only handle for observing the agent from external code.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::conversation::{ConversationSnapshot, ConversationState};

/// A cloneable handle for observing the agent from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct AgentHandle {
    pub(crate) state: Arc<Mutex<ConversationState>>,
    pub(crate) compaction_idle: Arc<tokio::sync::Notify>,
}

impl AgentHandle {
    pub(crate) fn new(state: ConversationState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            compaction_idle: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Copy of the current conversation state.
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.state.lock().clone()
    }

    /// Whether a chat request is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    /// Whether a compaction is in flight.
    pub fn is_compressing(&self) -> bool {
        self.state.lock().is_compressing
    }

    /// Wait until no compaction is running.
    pub async fn wait_for_compaction(&self) {
        let notified = self.compaction_idle.notified();
        if !self.is_compressing() {
            return;
        }
        notified.await;
    }

    /// Wait until no compaction is running, with a timeout.
    /// Returns `true` if idle was reached, `false` on timeout.
    pub async fn wait_for_compaction_timeout(&self, timeout: std::time::Duration) -> bool {
        if !self.is_compressing() {
            return true;
        }
        tokio::time::timeout(timeout, self.wait_for_compaction())
            .await
            .is_ok()
    }

    pub(crate) fn notify_compaction_idle(&self) {
        self.compaction_idle.notify_waiters();
    }
}
