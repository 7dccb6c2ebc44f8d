// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server-sent event stream.
//!
//! The device (and any open dashboard) keeps `GET /api/events` open. It
//! receives a `heartbeat` event right away and then once per interval, and
//! every payload published on the `"message"` channel as a `message` event.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use chrono::{SecondsFormat, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

use super::{AppState, DEFAULT_HEARTBEAT_INTERVAL};
use crate::broadcast::channel;
use crate::clock::non_zero_interval;

/// `GET /api/events`
pub async fn events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let messages = state.broadcaster.stream(channel::MESSAGE);
    tracing::debug!(subscription = %messages.subscription_id(), "Event stream opened");

    let messages = messages.map(|payload| Event::default().event(channel::MESSAGE).data(payload));

    // The first tick completes immediately and doubles as the greeting.
    let mut ticker = interval(non_zero_interval(
        state.heartbeat_interval,
        DEFAULT_HEARTBEAT_INTERVAL,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let heartbeats = IntervalStream::new(ticker).map(|_| {
        Event::default()
            .event(channel::HEARTBEAT)
            .data(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    });

    Sse::new(heartbeats.merge(messages).map(Ok))
}
