// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-process event broadcasting.
//!
//! The [`Broadcaster`] fans named events out to every listener registered on
//! a channel. It is the server half of the push connection: the streaming
//! endpoint turns a channel into an [`EventStream`] and forwards each payload
//! to the connected client.
//!
//! # Overview
//!
//! - [`SubscriptionId`] - handle returned on subscribe, used to unsubscribe
//! - [`Subscription`] - guard that unsubscribes when dropped
//! - [`EventStream`] - `Stream` of payloads that unsubscribes when dropped
//!
//! Delivery is fire-and-forget: no persistence, no replay, at most once per
//! listener.
//!
//! # Examples
//!
//! ```
//! use curtain_closer::broadcast::{Broadcaster, channel};
//!
//! let broadcaster = Broadcaster::new();
//! let id = broadcaster.subscribe(channel::MESSAGE, |payload| {
//!     println!("controller received {payload}");
//! });
//!
//! broadcaster.publish(channel::MESSAGE, "rotate:5");
//! broadcaster.unsubscribe(id);
//! ```

mod broadcaster;
mod stream;

pub use broadcaster::{Broadcaster, SubscriptionId};
pub use stream::{DEFAULT_STREAM_CAPACITY, EventStream, Subscription};

/// Well-known channel names.
pub mod channel {
    /// Device commands and dashboard events.
    pub const MESSAGE: &str = "message";

    /// Keep-alive events injected by the push transport.
    pub const HEARTBEAT: &str = "heartbeat";
}
