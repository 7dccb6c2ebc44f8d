// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the curtain closer.
//!
//! This module provides the error hierarchy shared by the token workflow,
//! the device layer and the HTTP boundary: capability failures, value
//! validation and device-configuration storage.

use thiserror::Error;

/// The main error type for this crate.
///
/// Every variant is recoverable at the request boundary; the HTTP layer
/// translates them into status responses and nothing here terminates the
/// process.
#[derive(Debug, Error)]
pub enum Error {
    /// No token was supplied on a token-gated request.
    #[error("token is required")]
    MissingToken,

    /// The token is unknown, revoked or expired.
    #[error("invalid token")]
    InvalidToken,

    /// The token does not exist (strict extend only).
    #[error("token not found")]
    TokenNotFound,

    /// The action discriminator was not recognized.
    #[error("unknown action: {0:?}")]
    UnknownAction(String),

    /// An open/close action needs a device record and none exists.
    #[error("no device configured")]
    NoDeviceConfigured,

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while persisting the device configuration.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A `HHMM` schedule time has a minute component of 60 or more.
    #[error("invalid schedule time {0:04}: minutes must be below 60")]
    InvalidMinutes(u16),
}

/// Errors related to the device-configuration store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not hold a valid configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 2400,
            actual: 2500,
        };
        assert_eq!(err.to_string(), "value 2500 is out of range [0, 2400]");
    }

    #[test]
    fn invalid_minutes_display_pads() {
        let err = ValueError::InvalidMinutes(761);
        assert_eq!(
            err.to_string(),
            "invalid schedule time 0761: minutes must be below 60"
        );
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::InvalidMinutes(99).into();
        assert!(matches!(err, Error::Value(ValueError::InvalidMinutes(99))));
    }

    #[test]
    fn unknown_action_display() {
        let err = Error::UnknownAction("dance".to_string());
        assert_eq!(err.to_string(), "unknown action: \"dance\"");
    }

    #[test]
    fn storage_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = StorageError::from(io).into();
        assert!(err.to_string().starts_with("storage error: I/O error"));
    }
}
