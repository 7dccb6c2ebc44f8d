// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration record.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Highest accepted `HHMM` value (midnight at the end of the day).
const SCHEDULE_MAX: u16 = 2400;

/// A time of day encoded as `HHMM`.
///
/// Valid values run from `0000` to `2400` with minutes below 60. `2400` is
/// accepted and treated as midnight.
///
/// # Examples
///
/// ```
/// use curtain_closer::device::ScheduleTime;
///
/// let seven_thirty = ScheduleTime::new(730).unwrap();
/// assert_eq!(seven_thirty.hour(), 7);
/// assert_eq!(seven_thirty.minute(), 30);
/// assert_eq!(seven_thirty.to_string(), "07:30");
///
/// assert!(ScheduleTime::new(2401).is_err());
/// assert!(ScheduleTime::new(1260).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ScheduleTime(u16);

impl ScheduleTime {
    /// Midnight at the start of the day.
    pub const MIDNIGHT: Self = Self(0);

    /// Creates a schedule time from its `HHMM` encoding.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` above 2400 and
    /// `ValueError::InvalidMinutes` when the minute part is 60 or more.
    pub fn new(hhmm: u16) -> Result<Self, ValueError> {
        if hhmm > SCHEDULE_MAX {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: SCHEDULE_MAX,
                actual: hhmm,
            });
        }
        if hhmm % 100 >= 60 {
            return Err(ValueError::InvalidMinutes(hhmm));
        }
        Ok(Self(hhmm))
    }

    /// Returns the raw `HHMM` value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the hour (0-23), with 2400 folded to 0.
    #[must_use]
    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 100 % 24)
    }

    /// Returns the minute (0-59).
    #[must_use]
    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 100)
    }

    /// Returns `true` if `time` falls within this schedule minute.
    #[must_use]
    pub fn matches(&self, time: NaiveTime) -> bool {
        time.hour() == self.hour() && time.minute() == self.minute()
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<u16> for ScheduleTime {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScheduleTime> for u16 {
    fn from(time: ScheduleTime) -> Self {
        time.0
    }
}

/// Configuration of the single curtain device.
///
/// # Examples
///
/// ```
/// use curtain_closer::device::{DeviceConfig, ScheduleTime};
///
/// let config = DeviceConfig::new(5, 5)
///     .with_open_at(ScheduleTime::new(700).unwrap())
///     .with_close_at(ScheduleTime::new(2130).unwrap())
///     .with_swapped_directions();
///
/// assert!(config.swap_open_close);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Motor rotations needed to open the curtain.
    pub open_rotations: u32,
    /// Motor rotations needed to close the curtain.
    pub close_rotations: u32,
    /// Time of day the curtain opens automatically.
    pub open_at: ScheduleTime,
    /// Time of day the curtain closes automatically.
    pub close_at: ScheduleTime,
    /// Inverts the rotation direction, for motors mounted the other way round.
    pub swap_open_close: bool,
}

impl DeviceConfig {
    /// Creates a configuration with both schedule times at midnight.
    #[must_use]
    pub fn new(open_rotations: u32, close_rotations: u32) -> Self {
        Self {
            open_rotations,
            close_rotations,
            open_at: ScheduleTime::MIDNIGHT,
            close_at: ScheduleTime::MIDNIGHT,
            swap_open_close: false,
        }
    }

    /// Sets the automatic opening time.
    #[must_use]
    pub fn with_open_at(mut self, at: ScheduleTime) -> Self {
        self.open_at = at;
        self
    }

    /// Sets the automatic closing time.
    #[must_use]
    pub fn with_close_at(mut self, at: ScheduleTime) -> Self {
        self.close_at = at;
        self
    }

    /// Inverts the rotation direction.
    #[must_use]
    pub fn with_swapped_directions(mut self) -> Self {
        self.swap_open_close = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_time_bounds() {
        assert!(ScheduleTime::new(0).is_ok());
        assert!(ScheduleTime::new(2359).is_ok());
        assert!(ScheduleTime::new(2400).is_ok());
        assert_eq!(
            ScheduleTime::new(2401),
            Err(ValueError::OutOfRange {
                min: 0,
                max: 2400,
                actual: 2401
            })
        );
        assert_eq!(ScheduleTime::new(975), Err(ValueError::InvalidMinutes(975)));
    }

    #[test]
    fn schedule_2400_is_midnight() {
        let t = ScheduleTime::new(2400).unwrap();
        assert_eq!(t.hour(), 0);
        assert_eq!(t.minute(), 0);
        assert!(t.matches(NaiveTime::from_hms_opt(0, 0, 30).unwrap()));
    }

    #[test]
    fn schedule_matches_whole_minute() {
        let t = ScheduleTime::new(1815).unwrap();
        assert!(t.matches(NaiveTime::from_hms_opt(18, 15, 0).unwrap()));
        assert!(t.matches(NaiveTime::from_hms_opt(18, 15, 59).unwrap()));
        assert!(!t.matches(NaiveTime::from_hms_opt(18, 16, 0).unwrap()));
    }

    #[test]
    fn config_json_uses_camel_case() {
        let config = DeviceConfig::new(4, 6)
            .with_open_at(ScheduleTime::new(730).unwrap())
            .with_close_at(ScheduleTime::new(2200).unwrap());

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "openRotations": 4,
                "closeRotations": 6,
                "openAt": 730,
                "closeAt": 2200,
                "swapOpenClose": false
            })
        );
    }

    #[test]
    fn config_json_rejects_bad_schedule() {
        let result: Result<DeviceConfig, _> = serde_json::from_value(serde_json::json!({
            "openRotations": 4,
            "closeRotations": 6,
            "openAt": 799,
            "closeAt": 2200,
            "swapOpenClose": false
        }));
        assert!(result.is_err());
    }
}
