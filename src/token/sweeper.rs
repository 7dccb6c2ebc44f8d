// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background sweep of expired tokens.
//!
//! Validation already refuses stale tokens, so the sweep is only a memory
//! bound for links that are issued and never opened again.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::TokenRegistry;
use crate::clock::non_zero_interval;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration for the sweep task.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Interval between sweeps.
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Spawns the periodic sweep task.
///
/// Returns a `CancellationToken` that stops the task when cancelled. A sweep
/// that panics is logged and the loop carries on with the next tick. A zero
/// interval is replaced by [`DEFAULT_SWEEP_INTERVAL`].
///
/// Must be called from within a tokio runtime.
#[must_use = "dropping the token leaves no way to stop the sweeper"]
pub fn spawn_sweeper(registry: Arc<TokenRegistry>, config: SweepConfig) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        run_sweep_loop(&registry, &config, &cancel_clone).await;
    });

    cancel
}

async fn run_sweep_loop(registry: &TokenRegistry, config: &SweepConfig, cancel: &CancellationToken) {
    let period = non_zero_interval(config.interval, DEFAULT_SWEEP_INTERVAL);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = period.as_secs(),
        "Token sweeper started"
    );

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Token sweeper shutting down");
                break;
            }
            _ = ticker.tick() => {
                sweep_once(registry);
            }
        }
    }
}

fn sweep_once(registry: &TokenRegistry) {
    match catch_unwind(AssertUnwindSafe(|| registry.sweep())) {
        Ok(0) => tracing::trace!("Token sweep: nothing expired"),
        Ok(removed) => tracing::info!(
            removed,
            remaining = registry.len(),
            "Token sweep completed"
        ),
        Err(_) => tracing::error!("Token sweep panicked; retrying on next tick"),
    }
}
