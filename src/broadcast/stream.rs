// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scoped subscriptions and the stream adapter used by push connections.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use super::{Broadcaster, SubscriptionId};

/// Default number of payloads buffered per stream before new ones are
/// dropped for that stream.
pub const DEFAULT_STREAM_CAPACITY: usize = 256;

/// A subscription that is removed when dropped.
#[derive(Debug)]
pub struct Subscription {
    broadcaster: Broadcaster,
    id: SubscriptionId,
}

impl Subscription {
    /// Returns the underlying subscription ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

impl Broadcaster {
    /// Registers a listener and returns a guard that unsubscribes it on drop.
    #[must_use = "the listener is removed as soon as the guard is dropped"]
    pub fn subscribe_scoped<F>(&self, channel: &str, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Subscription {
            broadcaster: self.clone(),
            id: self.subscribe(channel, listener),
        }
    }

    /// Subscribes to `channel` and returns the payloads as a stream.
    ///
    /// Up to [`DEFAULT_STREAM_CAPACITY`] payloads are buffered; beyond that
    /// the stream misses events. Dropping the stream removes its listener.
    #[must_use]
    pub fn stream(&self, channel: &str) -> EventStream {
        self.stream_with_capacity(channel, DEFAULT_STREAM_CAPACITY)
    }

    /// Like [`stream`](Self::stream) with a custom buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn stream_with_capacity(&self, channel: &str, capacity: usize) -> EventStream {
        let (sender, receiver) = mpsc::channel(capacity);
        let channel_name = channel.to_string();

        let subscription = self.subscribe_scoped(channel, move |payload| {
            if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(payload.to_string()) {
                tracing::warn!(channel = %channel_name, "Stream buffer full, dropping event");
            }
        });

        EventStream {
            receiver,
            subscription,
        }
    }
}

/// Stream of payloads published on one channel.
///
/// Returned by [`Broadcaster::stream`]. The stream never ends on its own;
/// it lives as long as the consumer holds it, and dropping it is what
/// deregisters the listener.
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::Receiver<String>,
    subscription: Subscription,
}

impl EventStream {
    /// Returns the subscription ID backing this stream.
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription.id()
    }
}

impl Stream for EventStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
