// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP surface.
//!
//! [`build_router`] wires the handlers onto an axum `Router`; [`AppState`]
//! carries the shared registry, broadcaster and identity check into them.
//!
//! | Route | Access |
//! |-------|--------|
//! | `GET /` | redirect to dashboard or login |
//! | `GET /api/events` | open |
//! | `GET`/`POST /demo/controls` | demo token |
//! | `GET`/`POST /dashboard` | identity |
//! | `GET`/`PUT /api/device` | identity |

mod config;
mod dashboard;
mod demo;
mod error;
mod events;
mod identity;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use config::{DEFAULT_BIND, DEFAULT_HEARTBEAT_INTERVAL, ServerConfig};
pub use dashboard::LOGIN_PATH;
pub use error::{ApiError, ErrorResponse};
pub use identity::{IdentityCheck, Principal, StaticKeyIdentity};

use crate::broadcast::Broadcaster;
use crate::clock::non_zero_interval;
use crate::demo::DemoLinks;
use crate::device::{
    CurtainController, DeviceStore, FileDeviceStore, InMemoryDeviceStore, SchedulerConfig,
    spawn_scheduler,
};
use crate::error::Result;
use crate::token::{SweepConfig, TokenRegistry, spawn_sweeper};

/// State shared by all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Demo-link workflow, which also owns the registry and controller.
    pub links: DemoLinks,
    /// Event broadcaster behind the push connection.
    pub broadcaster: Broadcaster,
    /// Dashboard identity check.
    pub identity: Arc<dyn IdentityCheck>,
    /// Fixed origin for demo links.
    pub public_origin: Option<String>,
    /// Interval between heartbeat events.
    pub heartbeat_interval: Duration,
}

impl AppState {
    /// Assembles the state from its parts.
    ///
    /// The broadcaster is taken from `links`' controller so commands and the
    /// push connection share one instance.
    #[must_use]
    pub fn new(links: DemoLinks, identity: Arc<dyn IdentityCheck>) -> Self {
        let broadcaster = links.controller().broadcaster().clone();
        Self {
            links,
            broadcaster,
            identity,
            public_origin: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Builds fresh state for `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the configured device file cannot be
    /// loaded.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store: Arc<dyn DeviceStore> = match &config.device_file {
            Some(path) => Arc::new(FileDeviceStore::open(path)?),
            None => Arc::new(InMemoryDeviceStore::new()),
        };
        let registry = TokenRegistry::new()
            .with_ttl(config.token_ttl)
            .with_extend_policy(config.extend_policy);
        let controller = CurtainController::new(store, Broadcaster::new());
        let links = DemoLinks::new(Arc::new(registry), controller);

        let mut state = Self::new(
            links,
            Arc::new(StaticKeyIdentity::new(config.authorization_key.clone())),
        )
        .with_heartbeat_interval(config.heartbeat_interval);
        state.public_origin.clone_from(&config.public_origin);
        Ok(state)
    }

    /// Sets the origin used in demo links.
    #[must_use]
    pub fn with_public_origin(mut self, origin: impl Into<String>) -> Self {
        self.public_origin = Some(origin.into());
        self
    }

    /// Sets the heartbeat interval. Zero keeps [`DEFAULT_HEARTBEAT_INTERVAL`].
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = non_zero_interval(interval, DEFAULT_HEARTBEAT_INTERVAL);
        self
    }

    /// Starts the token sweeper and the curtain scheduler.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "dropping the handle leaves no way to stop the tasks"]
    pub fn spawn_background_tasks(&self, sweep_interval: Duration) -> BackgroundTasks {
        BackgroundTasks {
            sweeper: spawn_sweeper(
                Arc::clone(self.links.registry()),
                SweepConfig {
                    interval: sweep_interval,
                },
            ),
            scheduler: spawn_scheduler(self.links.controller().clone(), SchedulerConfig::default()),
        }
    }
}

/// Handle on the background tasks started by
/// [`AppState::spawn_background_tasks`].
#[derive(Debug)]
pub struct BackgroundTasks {
    sweeper: CancellationToken,
    scheduler: CancellationToken,
}

impl BackgroundTasks {
    /// Stops all background tasks.
    pub fn shutdown(&self) {
        self.sweeper.cancel();
        self.scheduler.cancel();
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        });

    Router::new()
        .route("/", get(dashboard::index))
        .route("/api/events", get(events::events))
        .route(
            "/demo/controls",
            get(demo::show_controls).post(demo::perform_action),
        )
        .route(
            "/dashboard",
            get(dashboard::show_dashboard).post(dashboard::dashboard_action),
        )
        .route(
            "/api/device",
            get(dashboard::get_device).put(dashboard::put_device),
        )
        .layer(trace_layer)
        .with_state(state)
}
