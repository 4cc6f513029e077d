//! Per-order conversation history.
//!
//! The store is explicitly owned and injected into the orchestrator rather
//! than living as module-level state. A `parking_lot::RwLock` guards the map
//! so the orchestrator can be shared across server handlers; per-order
//! message sequences remain append-only.

use std::collections::HashMap;

use parking_lot::RwLock;

/// In-memory map from order id to its ordered message sequence.
///
/// Entries exist only for orders whose `initiate` completed successfully.
/// Lifetime is the process lifetime; there is no persistence or eviction.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    entries: RwLock<HashMap<String, Vec<String>>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the conversation for an order with its first
    /// message. Re-initiating an order replaces any previous conversation.
    pub fn begin(&self, order_id: &str, first_message: String) {
        self.entries
            .write()
            .insert(order_id.to_string(), vec![first_message]);
    }

    /// Append a message to an existing conversation.
    ///
    /// Returns `false` (and stores nothing) when the order has no
    /// conversation yet; appends never create entries.
    pub fn append(&self, order_id: &str, message: String) -> bool {
        match self.entries.write().get_mut(order_id) {
            Some(messages) => {
                messages.push(message);
                true
            }
            None => false,
        }
    }

    /// Whether the order has an active conversation.
    pub fn contains(&self, order_id: &str) -> bool {
        self.entries.read().contains_key(order_id)
    }

    /// Snapshot of an order's messages, oldest first.
    pub fn snapshot(&self, order_id: &str) -> Option<Vec<String>> {
        self.entries.read().get(order_id).cloned()
    }

    /// Number of messages recorded for an order.
    pub fn len(&self, order_id: &str) -> usize {
        self.entries.read().get(order_id).map_or(0, Vec::len)
    }

    /// Number of orders with active conversations.
    pub fn order_count(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_creates_single_entry() {
        let history = ConversationHistory::new();
        history.begin("ORD-1", "request".to_string());

        assert!(history.contains("ORD-1"));
        assert_eq!(history.len("ORD-1"), 1);
        assert_eq!(history.order_count(), 1);
    }

    #[test]
    fn begin_replaces_previous_conversation() {
        let history = ConversationHistory::new();
        history.begin("ORD-1", "first".to_string());
        history.append("ORD-1", "reply".to_string());

        history.begin("ORD-1", "fresh request".to_string());

        assert_eq!(
            history.snapshot("ORD-1"),
            Some(vec!["fresh request".to_string()])
        );
    }

    #[test]
    fn append_preserves_order() {
        let history = ConversationHistory::new();
        history.begin("ORD-1", "request".to_string());
        assert!(history.append("ORD-1", "reply".to_string()));
        assert!(history.append("ORD-1", "escalation".to_string()));

        assert_eq!(
            history.snapshot("ORD-1"),
            Some(vec![
                "request".to_string(),
                "reply".to_string(),
                "escalation".to_string(),
            ])
        );
    }

    #[test]
    fn append_to_unknown_order_is_rejected() {
        let history = ConversationHistory::new();

        assert!(!history.append("ORD-404", "reply".to_string()));
        assert!(!history.contains("ORD-404"));
        assert_eq!(history.order_count(), 0);
    }

    #[test]
    fn orders_are_independent() {
        let history = ConversationHistory::new();
        history.begin("ORD-1", "a".to_string());
        history.begin("ORD-2", "b".to_string());
        history.append("ORD-1", "c".to_string());

        assert_eq!(history.len("ORD-1"), 2);
        assert_eq!(history.len("ORD-2"), 1);
    }
}
