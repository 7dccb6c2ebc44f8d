// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curtain Closer - remote control server for a motorized curtain.
//!
//! The device keeps a server-sent event stream open and turns every
//! `rotate:<n>` message it receives into motor rotations. The owner controls
//! it from a dashboard and can hand out short-lived demo links that let
//! anyone open and close the curtain until the link expires.
//!
//! # Supported Features
//!
//! - **Capability tokens**: issue, validate, extend and revoke short-lived
//!   tokens, with lazy eviction and a periodic sweep
//! - **Event broadcasting**: fan-out of named events to live listeners,
//!   exposed as an SSE stream with heartbeats
//! - **Device control**: open/close commands derived from the stored device
//!   configuration, plus a daily open/close schedule
//! - **HTTP server**: demo controls, owner dashboard and device settings
//!
//! # Quick Start
//!
//! ```no_run
//! use curtain_closer::server::{AppState, ServerConfig, build_router};
//!
//! #[tokio::main]
//! async fn main() -> curtain_closer::Result<()> {
//!     let config = ServerConfig::new("change-me");
//!     let state = AppState::from_config(&config)?;
//!     let tasks = state.spawn_background_tasks(config.sweep_interval);
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind).await.unwrap();
//!     axum::serve(listener, build_router(state)).await.unwrap();
//!     tasks.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Demo Links Without the Server
//!
//! ```
//! use std::sync::Arc;
//! use curtain_closer::broadcast::{Broadcaster, channel};
//! use curtain_closer::demo::DemoLinks;
//! use curtain_closer::device::{CurtainAction, CurtainController, DeviceConfig, InMemoryDeviceStore};
//! use curtain_closer::token::TokenRegistry;
//!
//! let broadcaster = Broadcaster::new();
//! let _device = broadcaster.subscribe(channel::MESSAGE, |command| {
//!     println!("device received {command}");
//! });
//!
//! let store = Arc::new(InMemoryDeviceStore::with_config(DeviceConfig::new(4, 4)));
//! let links = DemoLinks::new(
//!     Arc::new(TokenRegistry::new()),
//!     CurtainController::new(store, broadcaster),
//! );
//!
//! let link = links.create_link("http://localhost:3000");
//! let dispatch = links.perform(Some(link.token.as_str()), CurtainAction::Open)?;
//! assert_eq!(dispatch.delivered, 1);
//! # Ok::<(), curtain_closer::Error>(())
//! ```

pub mod broadcast;
pub mod clock;
pub mod demo;
pub mod device;
pub mod error;
pub mod server;
pub mod token;

pub use broadcast::{Broadcaster, EventStream, SubscriptionId};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use demo::{DemoLink, DemoLinks};
pub use device::{CurtainAction, CurtainController, DeviceConfig, Dispatch, ScheduleTime};
pub use error::{Error, Result, StorageError, ValueError};
pub use token::{ExtendPolicy, Token, TokenEntry, TokenRegistry};
