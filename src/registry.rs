//! Support session registry
//!
//! Maps the identifier of every request posted into the support chat to the
//! user who sent it, so that team replies can be routed back.
//!
//! ## Bound policy
//!
//! The registry holds at most `capacity` sessions. Recording a new session into
//! a full registry evicts the oldest one (insertion order). Replies anchored on
//! an evicted request are treated as unknown sessions. Nothing else ever removes
//! an entry.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use teloxide::types::{MessageId, UserId};

/// Default number of sessions kept before the oldest is evicted
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A request posted to the support chat and the user it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryStats {
    /// Number of sessions currently stored
    pub entries: usize,
    /// Number of sessions evicted because the registry was full
    pub evicted: u64,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: HashMap<MessageId, SessionEntry>,
    order: VecDeque<MessageId>,
    evicted: u64,
}

/// Thread-safe, bounded mapping from support-chat message to originating user
#[derive(Debug)]
pub struct SupportSessionRegistry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
}

impl SupportSessionRegistry {
    /// Create a registry holding at most `capacity` sessions (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record that `message_id` in the support chat belongs to `user_id`.
    ///
    /// Re-recording an existing message overwrites the user but keeps the
    /// original position in the listing.
    pub fn record(&self, message_id: MessageId, user_id: UserId) {
        let mut inner = self.inner.lock();
        let recorded_at = Utc::now();

        if let Some(entry) = inner.entries.get_mut(&message_id) {
            entry.user_id = user_id;
            entry.recorded_at = recorded_at;
            return;
        }

        while inner.order.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.evicted += 1;
            tracing::debug!(message_id = %oldest, "Evicted oldest support session");
        }

        inner.order.push_back(message_id);
        inner.entries.insert(
            message_id,
            SessionEntry {
                message_id,
                user_id,
                recorded_at,
            },
        );
    }

    /// User that sent the request behind `message_id`, if known
    pub fn resolve(&self, message_id: MessageId) -> Option<UserId> {
        self.inner
            .lock()
            .entries
            .get(&message_id)
            .map(|entry| entry.user_id)
    }

    /// All sessions in insertion order
    pub fn list_all(&self) -> Vec<SessionEntry> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock();
        RegistryStats {
            entries: inner.order.len(),
            evicted: inner.evicted,
        }
    }
}

impl Default for SupportSessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_message() {
        let registry = SupportSessionRegistry::default();
        assert_eq!(registry.resolve(MessageId(1)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_and_resolve_many() {
        let registry = SupportSessionRegistry::default();
        registry.record(MessageId(100), UserId(1));
        for i in 0..500 {
            registry.record(MessageId(1_000 + i), UserId(50_000 + i as u64));
        }

        assert_eq!(registry.resolve(MessageId(100)), Some(UserId(1)));
        assert_eq!(registry.resolve(MessageId(1_250)), Some(UserId(50_250)));
        assert_eq!(registry.resolve(MessageId(99)), None);
        assert_eq!(registry.len(), 501);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let registry = SupportSessionRegistry::default();
        registry.record(MessageId(1), UserId(10));
        registry.record(MessageId(2), UserId(20));
        registry.record(MessageId(1), UserId(11));

        let listed: Vec<_> = registry
            .list_all()
            .into_iter()
            .map(|e| (e.message_id, e.user_id))
            .collect();
        assert_eq!(
            listed,
            vec![(MessageId(1), UserId(11)), (MessageId(2), UserId(20))]
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let registry = SupportSessionRegistry::new(2);
        registry.record(MessageId(1), UserId(10));
        registry.record(MessageId(2), UserId(20));
        registry.record(MessageId(3), UserId(30));

        assert_eq!(registry.resolve(MessageId(1)), None);
        assert_eq!(registry.resolve(MessageId(2)), Some(UserId(20)));
        assert_eq!(registry.resolve(MessageId(3)), Some(UserId(30)));

        let stats = registry.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let registry = SupportSessionRegistry::new(0);
        assert_eq!(registry.capacity(), 1);
        registry.record(MessageId(5), UserId(1));
        assert_eq!(registry.resolve(MessageId(5)), Some(UserId(1)));
    }
}
