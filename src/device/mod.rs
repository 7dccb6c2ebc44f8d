// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The curtain device.
//!
//! This module holds the device record ([`DeviceConfig`]), where it is kept
//! ([`DeviceStore`]), how actions become motor commands
//! ([`CurtainController`]) and the daily schedule ([`spawn_scheduler`]).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use curtain_closer::broadcast::Broadcaster;
//! use curtain_closer::device::{
//!     CurtainAction, CurtainController, DeviceConfig, InMemoryDeviceStore,
//! };
//!
//! let store = Arc::new(InMemoryDeviceStore::with_config(DeviceConfig::new(5, 5)));
//! let controller = CurtainController::new(store, Broadcaster::new());
//!
//! let dispatch = controller.trigger(CurtainAction::Open).unwrap();
//! assert_eq!(dispatch.command.payload(), "rotate:5");
//! ```

mod command;
mod config;
mod schedule;
mod store;

pub use command::{CurtainAction, CurtainController, Dispatch, RotateCommand};
pub use config::{DeviceConfig, ScheduleTime};
pub use schedule::{
    DEFAULT_SCHEDULE_TICK, ScheduleTracker, SchedulerConfig, spawn_scheduler,
};
pub use store::{DeviceStore, FileDeviceStore, InMemoryDeviceStore};
