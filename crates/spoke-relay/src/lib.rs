//! Spoke Relay - in-memory chat message relay
//!
//! Keeps the most recent messages in a bounded ring and fans new messages
//! out to registered subscribers. Each subscriber sees its backlog first,
//! then live messages in post order; nothing is guaranteed across
//! subscribers, and messages are not persisted.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use spoke_types::ChatMessage;

/// Most messages retained in the ring
pub const MAX_MESSAGES: usize = 100;

/// Handle identifying a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct RelayInner {
    messages: VecDeque<ChatMessage>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<ChatMessage>>,
}

/// Chat message relay
pub struct MessageRelay {
    inner: Mutex<RelayInner>,
    next_id: AtomicU64,
}

impl MessageRelay {
    /// Create an empty relay
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RelayInner {
                messages: VecDeque::with_capacity(MAX_MESSAGES),
                subscribers: HashMap::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a message and deliver it to every live subscriber
    ///
    /// The ring drops its oldest message once full. A subscriber whose
    /// receiver was dropped is detached here, on the next post.
    pub fn post(&self, message: ChatMessage) {
        let mut inner = self.inner.lock().expect("relay lock poisoned");

        inner.messages.push_back(message.clone());
        if inner.messages.len() > MAX_MESSAGES {
            inner.messages.pop_front();
        }

        inner
            .subscribers
            .retain(|id, tx| match tx.send(message.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(subscriber = id, "Detaching closed chat subscriber");
                    false
                }
            });
    }

    /// Register a subscriber
    ///
    /// The current backlog is queued on the returned channel before any
    /// live message, preserving post order end to end.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock().expect("relay lock poisoned");
        for message in &inner.messages {
            // Receiver is in hand, the channel cannot be closed yet
            let _ = tx.send(message.clone());
        }
        inner.subscribers.insert(id, tx);

        (SubscriberId(id), rx)
    }

    /// Remove a subscriber registration
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut inner = self.inner.lock().expect("relay lock poisoned");
        inner.subscribers.remove(&id.0);
    }

    /// Snapshot of the retained messages, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        let inner = self.inner.lock().expect("relay lock poisoned");
        inner.messages.iter().cloned().collect()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().expect("relay lock poisoned");
        inner.subscribers.len()
    }
}

impl Default for MessageRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRelay").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoke_types::PrincipalId;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::new(PrincipalId::new(), "alice", text)
    }

    #[test]
    fn test_ring_is_bounded() {
        let relay = MessageRelay::new();
        for i in 0..(MAX_MESSAGES + 10) {
            relay.post(msg(&format!("m{i}")));
        }

        let messages = relay.messages();
        assert_eq!(messages.len(), MAX_MESSAGES);
        assert_eq!(messages[0].text, "m10");
        assert_eq!(messages.last().unwrap().text, format!("m{}", MAX_MESSAGES + 9));
    }

    #[tokio::test]
    async fn test_subscriber_gets_backlog_then_live_in_order() {
        let relay = MessageRelay::new();
        relay.post(msg("first"));
        relay.post(msg("second"));

        let (_id, mut rx) = relay.subscribe();
        relay.post(msg("third"));

        assert_eq!(rx.recv().await.unwrap().text, "first");
        assert_eq!(rx.recv().await.unwrap().text, "second");
        assert_eq!(rx.recv().await.unwrap().text, "third");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let relay = MessageRelay::new();
        let (id, mut rx) = relay.subscribe();
        relay.unsubscribe(id);
        relay.post(msg("after"));

        // Sender side is gone, the channel yields None
        assert!(rx.recv().await.is_none());
        assert_eq!(relay.subscriber_count(), 0);
    }

    #[test]
    fn test_dropped_receiver_is_detached_on_post() {
        let relay = MessageRelay::new();
        let (_id, rx) = relay.subscribe();
        drop(rx);

        relay.post(msg("hello"));
        assert_eq!(relay.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_independent_subscribers_each_see_all_messages() {
        let relay = MessageRelay::new();
        let (_a, mut rx_a) = relay.subscribe();
        let (_b, mut rx_b) = relay.subscribe();

        relay.post(msg("one"));
        relay.post(msg("two"));

        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.recv().await.unwrap().text, "one");
            assert_eq!(rx.recv().await.unwrap().text, "two");
        }
    }
}
