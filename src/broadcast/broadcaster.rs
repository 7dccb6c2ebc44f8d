// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel-keyed listener registry with synchronous fan-out.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Unique identifier for a subscription.
///
/// Returned by [`Broadcaster::subscribe`] and accepted by
/// [`Broadcaster::unsubscribe`]. IDs increase monotonically, which is what
/// gives listeners on a channel their registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// A listener invoked with each payload published on its channel.
type Listener = Arc<dyn Fn(&str) + Send + Sync>;

struct Inner {
    next_id: AtomicU64,
    channels: RwLock<HashMap<String, BTreeMap<SubscriptionId, Listener>>>,
}

/// Process-wide publish point for named events.
///
/// Producers call [`publish`](Self::publish) with a channel name and a
/// string payload; every listener currently registered on that channel is
/// invoked synchronously, in registration order, before `publish` returns.
///
/// # Delivery
///
/// Delivery is best-effort and at-most-once. Nothing is buffered: an event
/// published while a channel has no listeners is dropped, and a listener
/// registered later never sees it. Events from one producer reach a given
/// listener in publish order.
///
/// # Sharing
///
/// `Broadcaster` is a cheap handle; clones share the same listeners.
/// Listeners are called outside the internal lock, so a listener may
/// itself subscribe or unsubscribe.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use curtain_closer::broadcast::Broadcaster;
///
/// let broadcaster = Broadcaster::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let id = broadcaster.subscribe("message", move |payload| {
///     sink.lock().push(payload.to_string());
/// });
///
/// broadcaster.publish("message", "rotate:5");
/// broadcaster.unsubscribe(id);
/// broadcaster.publish("message", "rotate:-5");
///
/// assert_eq!(*seen.lock(), vec!["rotate:5".to_string()]);
/// ```
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Creates a broadcaster with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a listener on `channel`.
    pub fn subscribe<F>(&self, channel: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.inner
            .channels
            .write()
            .entry(channel.to_string())
            .or_default()
            .insert(id, Arc::new(listener));
        tracing::debug!(%id, channel, "Listener subscribed");
        id
    }

    /// Removes a single listener.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut channels = self.inner.channels.write();

        let Some(channel) = channels
            .iter()
            .find_map(|(name, listeners)| listeners.contains_key(&id).then(|| name.clone()))
        else {
            return false;
        };

        if let Some(listeners) = channels.get_mut(&channel) {
            listeners.remove(&id);
            if listeners.is_empty() {
                channels.remove(&channel);
            }
        }
        tracing::debug!(%id, channel = %channel, "Listener unsubscribed");
        true
    }

    /// Removes every listener on `channel` and returns how many there were.
    ///
    /// This is not per-listener safe: when several subscribers share a
    /// channel, it tears all of them down. Prefer
    /// [`unsubscribe`](Self::unsubscribe) with the handle returned by
    /// [`subscribe`](Self::subscribe).
    pub fn unsubscribe_all(&self, channel: &str) -> usize {
        let removed = self
            .inner
            .channels
            .write()
            .remove(channel)
            .map_or(0, |listeners| listeners.len());
        if removed > 0 {
            tracing::debug!(channel, removed, "Removed all listeners");
        }
        removed
    }

    /// Publishes `payload` to every listener on `channel`.
    ///
    /// If there are no listeners the event is silently discarded.
    pub fn publish(&self, channel: &str, payload: &str) {
        let _ = self.publish_counted(channel, payload);
    }

    /// Publishes `payload` and returns the number of listeners invoked.
    #[must_use]
    pub fn publish_counted(&self, channel: &str, payload: &str) -> usize {
        // Snapshot under the read lock, call outside it
        let listeners: Vec<Listener> = self
            .inner
            .channels
            .read()
            .get(channel)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload);
        }

        tracing::trace!(channel, delivered = listeners.len(), "Published event");
        listeners.len()
    }

    /// Returns the number of listeners on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .read()
            .get(channel)
            .map_or(0, BTreeMap::len)
    }

    /// Returns the number of listeners across all channels.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.inner.channels.read().values().map(BTreeMap::len).sum()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("total_listeners", &self.total_listeners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;

    fn recorder(broadcaster: &Broadcaster, channel: &str) -> (SubscriptionId, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = broadcaster.subscribe(channel, move |payload| {
            sink.lock().push(payload.to_string());
        });
        (id, seen)
    }

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId(42).to_string(), "Sub(42)");
    }

    #[test]
    fn new_broadcaster_has_no_listeners() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.total_listeners(), 0);
        assert_eq!(broadcaster.listener_count("message"), 0);
    }

    #[test]
    fn publish_without_listeners_is_silent() {
        let broadcaster = Broadcaster::new();
        broadcaster.publish("message", "ignored");
        assert_eq!(broadcaster.publish_counted("message", "ignored"), 0);
    }

    #[test]
    fn listener_receives_in_publish_order() {
        let broadcaster = Broadcaster::new();
        let (_id, seen) = recorder(&broadcaster, "message");

        for payload in ["a", "b", "c"] {
            broadcaster.publish("message", payload);
        }

        assert_eq!(*seen.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn listener_ignores_other_channels() {
        let broadcaster = Broadcaster::new();
        let (_id, seen) = recorder(&broadcaster, "message");

        broadcaster.publish("heartbeat", "tick");
        broadcaster.publish("other", "x");

        assert!(seen.lock().is_empty());
    }

    #[test]
    fn late_subscriber_gets_no_history() {
        let broadcaster = Broadcaster::new();
        broadcaster.publish("message", "before");
        let (_id, seen) = recorder(&broadcaster, "message");
        broadcaster.publish("message", "after");

        assert_eq!(*seen.lock(), vec!["after"]);
    }

    #[test]
    fn listeners_called_in_registration_order() {
        let broadcaster = Broadcaster::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..5 {
            let order = Arc::clone(&order);
            broadcaster.subscribe("message", move |_| order.lock().push(n));
        }
        broadcaster.publish("message", "go");

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let broadcaster = Broadcaster::new();
        let (id, seen) = recorder(&broadcaster, "message");

        broadcaster.publish("message", "one");
        assert!(broadcaster.unsubscribe(id));
        broadcaster.publish("message", "two");

        assert_eq!(*seen.lock(), vec!["one"]);
        assert_eq!(broadcaster.listener_count("message"), 0);
    }

    #[test]
    fn unsubscribe_only_removes_that_listener() {
        let broadcaster = Broadcaster::new();
        let (first, first_seen) = recorder(&broadcaster, "message");
        let (_second, second_seen) = recorder(&broadcaster, "message");

        broadcaster.unsubscribe(first);
        broadcaster.publish("message", "hello");

        assert!(first_seen.lock().is_empty());
        assert_eq!(*second_seen.lock(), vec!["hello"]);
    }

    #[test]
    fn unsubscribe_unknown_returns_false() {
        let broadcaster = Broadcaster::new();
        assert!(!broadcaster.unsubscribe(SubscriptionId(999)));
    }

    #[test]
    fn unsubscribe_all_clears_channel_only() {
        let broadcaster = Broadcaster::new();
        let (_a, _) = recorder(&broadcaster, "message");
        let (_b, _) = recorder(&broadcaster, "message");
        let (_c, heartbeat_seen) = recorder(&broadcaster, "heartbeat");

        assert_eq!(broadcaster.unsubscribe_all("message"), 2);
        assert_eq!(broadcaster.unsubscribe_all("message"), 0);

        broadcaster.publish("heartbeat", "tick");
        assert_eq!(*heartbeat_seen.lock(), vec!["tick"]);
        assert_eq!(broadcaster.total_listeners(), 1);
    }

    #[test]
    fn publish_counted_reports_listeners() {
        let broadcaster = Broadcaster::new();
        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            broadcaster.subscribe("message", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(broadcaster.publish_counted("message", "x"), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let broadcaster = Broadcaster::new();
        let handle = broadcaster.clone();
        let slot = Arc::new(Mutex::new(None::<SubscriptionId>));
        let slot_clone = Arc::clone(&slot);

        let id = broadcaster.subscribe("message", move |_| {
            if let Some(id) = *slot_clone.lock() {
                handle.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        broadcaster.publish("message", "bye");
        assert_eq!(broadcaster.listener_count("message"), 0);
    }

    #[test]
    fn clone_shares_listeners() {
        let a = Broadcaster::new();
        let b = a.clone();
        let (_id, seen) = recorder(&a, "message");

        b.publish("message", "shared");
        assert_eq!(*seen.lock(), vec!["shared"]);
    }

    #[test]
    fn unique_ids() {
        let broadcaster = Broadcaster::new();
        let a = broadcaster.subscribe("message", |_| {});
        let b = broadcaster.subscribe("heartbeat", |_| {});
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn debug_shows_listener_count() {
        let broadcaster = Broadcaster::new();
        broadcaster.subscribe("message", |_| {});
        let debug = format!("{broadcaster:?}");
        assert!(debug.contains("total_listeners: 1"));
    }
}
