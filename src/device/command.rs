// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curtain actions and the commands sent to the device.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::{DeviceConfig, DeviceStore};
use crate::broadcast::{Broadcaster, channel};
use crate::error::{Error, Result};

// ============================================================================
// CurtainAction
// ============================================================================

/// What the user (or the schedule) wants the curtain to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurtainAction {
    /// Open the curtain.
    Open,
    /// Close the curtain.
    Close,
}

impl CurtainAction {
    /// Returns the lowercase action name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for CurtainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurtainAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

// ============================================================================
// RotateCommand
// ============================================================================

/// Motor command derived from an action and the device configuration.
///
/// Positive rotations open, negative rotations close; `swap_open_close`
/// inverts the sign. The wire form is `rotate:<signed rotations>`.
///
/// # Examples
///
/// ```
/// use curtain_closer::device::{CurtainAction, DeviceConfig, RotateCommand};
///
/// let config = DeviceConfig::new(5, 7);
/// assert_eq!(RotateCommand::for_action(CurtainAction::Open, &config).payload(), "rotate:5");
/// assert_eq!(RotateCommand::for_action(CurtainAction::Close, &config).payload(), "rotate:-7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateCommand {
    rotations: i64,
}

impl RotateCommand {
    /// Builds the command for `action` on the configured device.
    #[must_use]
    pub fn for_action(action: CurtainAction, config: &DeviceConfig) -> Self {
        let rotations = match action {
            CurtainAction::Open => i64::from(config.open_rotations),
            CurtainAction::Close => -i64::from(config.close_rotations),
        };

        Self {
            rotations: if config.swap_open_close {
                -rotations
            } else {
                rotations
            },
        }
    }

    /// Returns the signed number of rotations.
    #[must_use]
    pub const fn rotations(&self) -> i64 {
        self.rotations
    }

    /// Returns the payload published to the device.
    #[must_use]
    pub fn payload(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RotateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rotate:{}", self.rotations)
    }
}

impl Serialize for RotateCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// CurtainController
// ============================================================================

/// Outcome of a triggered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    /// The action that was performed.
    pub action: CurtainAction,
    /// The command published to the device.
    pub command: RotateCommand,
    /// Number of listeners the command reached.
    pub delivered: usize,
}

/// Turns curtain actions into device commands.
///
/// The controller looks up the device configuration, derives the rotate
/// command and publishes it on the `"message"` channel, where the device's
/// push connection picks it up.
#[derive(Debug, Clone)]
pub struct CurtainController {
    store: Arc<dyn DeviceStore>,
    broadcaster: Broadcaster,
}

impl CurtainController {
    /// Creates a controller over `store` publishing through `broadcaster`.
    #[must_use]
    pub fn new(store: Arc<dyn DeviceStore>, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Returns the device store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DeviceStore> {
        &self.store
    }

    /// Returns the broadcaster commands are published through.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Performs `action` on the configured device.
    ///
    /// Delivery is best effort: with no device connected the command reaches
    /// nobody and `delivered` is zero.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDeviceConfigured` if the store holds no device.
    pub fn trigger(&self, action: CurtainAction) -> Result<Dispatch> {
        let config = self.store.get().ok_or(Error::NoDeviceConfigured)?;
        let command = RotateCommand::for_action(action, &config);

        let delivered = self
            .broadcaster
            .publish_counted(channel::MESSAGE, &command.payload());

        tracing::info!(%action, %command, delivered, "Curtain action dispatched");

        Ok(Dispatch {
            action,
            command,
            delivered,
        })
    }
}
