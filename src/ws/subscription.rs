//! Per-connection subscription manager.
//!
//! Tracks which request IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::RequestId;

/// Manages the set of request subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed request IDs. If `subscribe_all` is true, this set is ignored.
    request_ids: HashSet<RequestId>,
    /// Whether the client subscribes to all requests (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds request IDs to the subscription set. `"*"` enables the wildcard.
    pub fn subscribe(&mut self, ids: &[RequestId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in ids {
            self.request_ids.insert(*id);
        }
    }

    /// Removes request IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[RequestId]) {
        for id in ids {
            self.request_ids.remove(id);
        }
    }

    /// Returns `true` if the given request ID matches the subscription filter.
    #[must_use]
    pub fn matches(&self, request_id: RequestId) -> bool {
        self.subscribe_all || self.request_ids.contains(&request_id)
    }

    /// Returns the number of explicitly subscribed request IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.request_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(RequestId::new()));
    }

    #[test]
    fn subscribe_specific_request() {
        let mut mgr = SubscriptionManager::new();
        let id = RequestId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        assert!(!mgr.matches(RequestId::new()));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(RequestId::new()));
        assert!(mgr.matches(RequestId::new()));
    }

    #[test]
    fn unsubscribe_removes_request() {
        let mut mgr = SubscriptionManager::new();
        let id = RequestId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        mgr.unsubscribe(&[id]);
        assert!(!mgr.matches(id));
    }

    #[test]
    fn count_tracks_explicit() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.count(), 0);
        mgr.subscribe(&[RequestId::new(), RequestId::new()], false);
        assert_eq!(mgr.count(), 2);
    }
}
