// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Daily open/close schedule.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::{CurtainAction, CurtainController, DeviceConfig};
use crate::clock::non_zero_interval;

/// Default interval between schedule checks.
///
/// Shorter than a minute so every `HHMM` slot is observed at least once.
pub const DEFAULT_SCHEDULE_TICK: Duration = Duration::from_secs(30);

/// Tracks which scheduled actions already ran today.
#[derive(Debug, Default)]
pub struct ScheduleTracker {
    last_fired: HashMap<CurtainAction, NaiveDate>,
}

impl ScheduleTracker {
    /// Creates a tracker that has fired nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actions due at `now`, marking them as fired for the day.
    ///
    /// An action is due when the current minute equals its configured time
    /// and it has not fired yet on `now`'s date. When both times coincide
    /// only `Close` fires.
    pub fn due(&mut self, now: NaiveDateTime, config: &DeviceConfig) -> Vec<CurtainAction> {
        let today = now.date();
        let time = now.time();
        let mut actions = Vec::new();

        if config.open_at != config.close_at && config.open_at.matches(time) {
            actions.push(CurtainAction::Open);
        }
        if config.close_at.matches(time) {
            actions.push(CurtainAction::Close);
        }

        actions.retain(|action| self.last_fired.get(action) != Some(&today));
        for action in &actions {
            self.last_fired.insert(*action, today);
        }
        actions
    }
}

/// Configuration for the scheduler task.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between schedule checks.
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_SCHEDULE_TICK,
        }
    }
}

/// Spawns the task that opens and closes the curtain on schedule.
///
/// Uses local wall-clock time. Failures and panics raised while triggering
/// are logged and never stop the task. A zero tick is replaced by
/// [`DEFAULT_SCHEDULE_TICK`]. Returns a `CancellationToken` that stops the
/// task when cancelled.
///
/// Must be called from within a tokio runtime.
#[must_use = "dropping the token leaves no way to stop the scheduler"]
pub fn spawn_scheduler(controller: CurtainController, config: SchedulerConfig) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        let tick = non_zero_interval(config.tick, DEFAULT_SCHEDULE_TICK);
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tracker = ScheduleTracker::new();

        tracing::info!(tick_secs = tick.as_secs(), "Curtain scheduler started");

        loop {
            tokio::select! {
                () = cancel_clone.cancelled() => {
                    tracing::info!("Curtain scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    check_schedule(&controller, &mut tracker, Local::now().naive_local());
                }
            }
        }
    });

    cancel
}

fn check_schedule(controller: &CurtainController, tracker: &mut ScheduleTracker, now: NaiveDateTime) {
    if catch_unwind(AssertUnwindSafe(|| run_due(controller, tracker, now))).is_err() {
        tracing::error!("Schedule check panicked; retrying on next tick");
    }
}

fn run_due(controller: &CurtainController, tracker: &mut ScheduleTracker, now: NaiveDateTime) {
    let Some(config) = controller.store().get() else {
        tracing::trace!("Schedule check skipped: no device configured");
        return;
    };

    for action in tracker.due(now, &config) {
        match controller.trigger(action) {
            Ok(dispatch) => tracing::info!(
                %action,
                delivered = dispatch.delivered,
                "Scheduled curtain action ran"
            ),
            Err(e) => tracing::warn!(%action, error = %e, "Scheduled curtain action failed"),
        }
    }
}
