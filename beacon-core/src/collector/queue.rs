//! Pending-event queue
//!
//! Ordered, append-only buffer of events awaiting transmission. Draining
//! swaps out the backing buffer under the lock, so an event can never
//! appear in two successive drains and a concurrent enqueue lands in a
//! fresh queue instead of racing on the batch being transmitted.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::events::Event;

/// Bounded FIFO of pending events.
///
/// The reference design is unbounded; this one evicts the oldest event
/// once `capacity` is reached so a long collector outage cannot grow
/// memory without limit.
#[derive(Debug)]
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct QueueInner {
    events: VecDeque<Event>,
    dropped: u64,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Append an event at the tail. Never blocks; at capacity the oldest
    /// event is evicted (drop-oldest).
    pub fn enqueue(&self, event: Event) {
        let mut inner = self.inner.lock().unwrap();
        if inner.events.len() >= self.capacity {
            inner.events.pop_front();
            inner.dropped += 1;
            tracing::warn!(
                dropped_total = inner.dropped,
                capacity = self.capacity,
                "Event queue full, evicted oldest event"
            );
        }
        inner.events.push_back(event);
    }

    /// Atomically take the full queue contents, leaving it empty.
    ///
    /// Insertion order is preserved. The buffer is swapped, not copied
    /// and cleared, so enqueues racing with a drain start a fresh queue.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut inner = self.inner.lock().unwrap();
        std::mem::take(&mut inner.events).into()
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events evicted since construction.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().unwrap().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ClientEnvironment;
    use serde_json::json;

    fn test_event(tag: &str) -> Event {
        let env = ClientEnvironment {
            user_agent: "test".to_string(),
            page_url: "https://example.com".to_string(),
            referrer: String::new(),
            screen_resolution: "800x600".to_string(),
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
        };
        Event::build(tag, json!({}), "session_test_1", &env)
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let queue = EventQueue::new(16);
        for tag in ["a", "b", "c", "d"] {
            queue.enqueue(test_event(tag));
        }

        let drained = queue.drain_all();
        let tags: Vec<&str> = drained.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(tags, vec!["a", "b", "c", "d"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue = EventQueue::new(16);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_no_event_in_two_drains() {
        let queue = EventQueue::new(16);
        queue.enqueue(test_event("a"));
        let first = queue.drain_all();
        queue.enqueue(test_event("b"));
        let second = queue.drain_all();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].event_type, "a");
        assert_eq!(second[0].event_type, "b");
    }

    #[test]
    fn test_drop_oldest_at_capacity() {
        let queue = EventQueue::new(3);
        for tag in ["a", "b", "c", "d", "e"] {
            queue.enqueue(test_event(tag));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 2);
        let tags: Vec<String> = queue
            .drain_all()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(tags, vec!["c", "d", "e"]);
    }
}
