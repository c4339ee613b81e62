//! Message publisher seam
//!
//! Fire-and-forget publishing used by the daily-history fill engine to
//! request its own continuation. Delivery is at-least-once; consumers must
//! be idempotent.

use parking_lot::Mutex;

/// Fire-and-forget message publisher
pub trait MessagePublisher: Send + Sync {
    /// Publish a payload to a topic
    ///
    /// Failures are the broker's problem; this interface has no error
    /// channel by design of the continuation protocol (a lost message only
    /// delays the fill until the next render retriggers it).
    fn publish(&self, topic: &str, payload: &str);
}

/// In-memory publisher that records every published message
///
/// The production broker binding lives outside this workspace; this
/// implementation backs tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<(String, String)>>,
}

impl MemoryPublisher {
    /// Create an empty publisher
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far, in order
    #[must_use]
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }

    /// Number of messages published to a topic
    #[must_use]
    pub fn count_for(&self, topic: &str) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }
}

impl MessagePublisher for MemoryPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        self.messages
            .lock()
            .push((topic.to_string(), payload.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_messages_in_order() {
        let publisher = MemoryPublisher::new();
        publisher.publish("fill", "a");
        publisher.publish("fill", "b");
        publisher.publish("other", "c");

        assert_eq!(publisher.messages().len(), 3);
        assert_eq!(publisher.count_for("fill"), 2);
        assert_eq!(publisher.messages()[0], ("fill".to_string(), "a".to_string()));
    }
}
