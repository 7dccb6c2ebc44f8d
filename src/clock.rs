// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall-clock time source.
//!
//! Token expiry is expressed in milliseconds since the Unix epoch. The
//! registry reads the current time through the [`Clock`] trait so tests can
//! drive expiry with a [`ManualClock`] instead of sleeping past the TTL.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An instant in milliseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use curtain_closer::clock::Timestamp;
///
/// let t = Timestamp::from_millis(1_000);
/// assert_eq!(t.saturating_add(Duration::from_secs(60)).as_millis(), 61_000);
/// assert!(t.is_before(Timestamp::from_millis(1_001)));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the epoch milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns this instant shifted forward by `duration`, saturating at
    /// `i64::MAX`.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Returns `true` if this instant is strictly earlier than `other`.
    #[must_use]
    pub fn is_before(&self, other: Self) -> bool {
        self.0 < other.0
    }

    /// Converts to a UTC date-time, if representable.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system's real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().into()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use curtain_closer::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// clock.advance(Duration::from_secs(30));
/// assert_eq!(clock.now().as_millis(), 30_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given epoch milliseconds.
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let step = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(step, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }
}

/// Returns `interval`, or `fallback` when `interval` is zero.
///
/// `tokio::time::interval` panics on a zero period, so every timer period
/// that comes from configuration goes through here first.
pub(crate) fn non_zero_interval(interval: Duration, fallback: Duration) -> Duration {
    if interval.is_zero() {
        tracing::warn!(
            fallback_ms = fallback.as_millis(),
            "Zero timer interval replaced by default"
        );
        fallback
    } else {
        interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_serializes_as_number() {
        let json = serde_json::to_string(&Timestamp::from_millis(1234)).unwrap();
        assert_eq!(json, "1234");
    }

    #[test]
    fn timestamp_display_is_rfc3339() {
        let t = Timestamp::from_millis(0);
        assert_eq!(t.to_string(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn saturating_add_does_not_overflow() {
        let t = Timestamp::from_millis(i64::MAX - 1);
        assert_eq!(
            t.saturating_add(Duration::from_secs(1)).as_millis(),
            i64::MAX
        );
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(10);
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now().as_millis(), 15);

        clock.set(Timestamp::from_millis(100));
        assert_eq!(clock.now().as_millis(), 100);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn zero_interval_falls_back() {
        let fallback = Duration::from_secs(60);
        assert_eq!(non_zero_interval(Duration::ZERO, fallback), fallback);
        assert_eq!(
            non_zero_interval(Duration::from_millis(250), fallback),
            Duration::from_millis(250)
        );
    }
}
