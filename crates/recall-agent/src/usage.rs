//! Session token accounting.

use recall_ai::TokenUsage;

/// Aggregates per-call usage into the session totals.
///
/// `last` tracks only the most recent user-visible reply; background calls
/// (compaction) count toward `total` without touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageAccumulator {
    last: Option<TokenUsage>,
    total: TokenUsage,
}

impl UsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usage of the last visible reply, if it reported any
    pub fn last(&self) -> Option<TokenUsage> {
        self.last
    }

    /// Cumulative usage since the last reset
    pub fn total(&self) -> TokenUsage {
        self.total
    }

    /// Forget the last reply's usage while a new request is in flight
    pub fn begin_turn(&mut self) {
        self.last = None;
    }

    /// Record the usage of a visible chat reply
    pub fn record_turn(&mut self, usage: TokenUsage) {
        self.last = Some(usage);
        self.total += usage;
    }

    /// Record usage of a call that produced no visible turn
    pub fn record_background(&mut self, usage: TokenUsage) {
        self.total += usage;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_update_last_and_total() {
        let mut acc = UsageAccumulator::new();
        acc.record_turn(TokenUsage::new(10, 2, 12));
        acc.record_turn(TokenUsage::new(20, 3, 23));
        assert_eq!(acc.last(), Some(TokenUsage::new(20, 3, 23)));
        assert_eq!(acc.total(), TokenUsage::new(30, 5, 35));
    }

    #[test]
    fn test_background_only_updates_total() {
        let mut acc = UsageAccumulator::new();
        acc.record_turn(TokenUsage::new(10, 2, 12));
        acc.record_background(TokenUsage::new(50, 10, 60));
        assert_eq!(acc.last(), Some(TokenUsage::new(10, 2, 12)));
        assert_eq!(acc.total().total_tokens, 72);
    }

    #[test]
    fn test_begin_turn_clears_last_only() {
        let mut acc = UsageAccumulator::new();
        acc.record_turn(TokenUsage::new(1, 1, 2));
        acc.begin_turn();
        assert_eq!(acc.last(), None);
        assert_eq!(acc.total().total_tokens, 2);
    }

    #[test]
    fn test_reset() {
        let mut acc = UsageAccumulator::new();
        acc.record_turn(TokenUsage::new(1, 1, 2));
        acc.reset();
        assert_eq!(acc, UsageAccumulator::default());
        assert!(acc.total().is_zero());
    }
}
