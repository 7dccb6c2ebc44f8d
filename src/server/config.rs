// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::clock::non_zero_interval;
use crate::token::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TOKEN_TTL, ExtendPolicy};

/// Default listen address.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000);

/// Default interval between heartbeat events on a push connection.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Everything needed to assemble and run the server.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use curtain_closer::server::ServerConfig;
///
/// let config = ServerConfig::new("s3cret")
///     .with_public_origin("https://curtain.example")
///     .with_token_ttl(Duration::from_secs(120));
///
/// assert_eq!(config.public_origin.as_deref(), Some("https://curtain.example"));
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// Shared key dashboard clients present as a bearer token.
    pub authorization_key: String,
    /// Origin used in demo links; derived from the `Host` header when unset.
    pub public_origin: Option<String>,
    /// JSON file holding the device configuration; in memory when unset.
    pub device_file: Option<PathBuf>,
    /// How extending an unknown token is handled.
    pub extend_policy: ExtendPolicy,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Interval between expired-token sweeps.
    pub sweep_interval: Duration,
    /// Interval between heartbeat events.
    pub heartbeat_interval: Duration,
}

impl ServerConfig {
    /// Creates a configuration with defaults and the given dashboard key.
    #[must_use]
    pub fn new(authorization_key: impl Into<String>) -> Self {
        Self {
            bind: DEFAULT_BIND,
            authorization_key: authorization_key.into(),
            public_origin: None,
            device_file: None,
            extend_policy: ExtendPolicy::default(),
            token_ttl: DEFAULT_TOKEN_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Sets the listen address.
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Sets the origin used in demo links.
    #[must_use]
    pub fn with_public_origin(mut self, origin: impl Into<String>) -> Self {
        self.public_origin = Some(origin.into());
        self
    }

    /// Persists the device configuration to `path`.
    #[must_use]
    pub fn with_device_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_file = Some(path.into());
        self
    }

    /// Sets the extend policy.
    #[must_use]
    pub fn with_extend_policy(mut self, policy: ExtendPolicy) -> Self {
        self.extend_policy = policy;
        self
    }

    /// Sets the token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Sets the sweep interval. Zero keeps [`DEFAULT_SWEEP_INTERVAL`].
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = non_zero_interval(interval, DEFAULT_SWEEP_INTERVAL);
        self
    }

    /// Sets the heartbeat interval. Zero keeps [`DEFAULT_HEARTBEAT_INTERVAL`].
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = non_zero_interval(interval, DEFAULT_HEARTBEAT_INTERVAL);
        self
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("authorization_key", &"<redacted>")
            .field("public_origin", &self.public_origin)
            .field("device_file", &self.device_file)
            .field("extend_policy", &self.extend_policy)
            .field("token_ttl", &self.token_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("key");
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(config.extend_policy, ExtendPolicy::Lenient);
        assert!(config.public_origin.is_none());
        assert!(config.device_file.is_none());
    }

    #[test]
    fn zero_intervals_keep_defaults() {
        let config = ServerConfig::new("key")
            .with_sweep_interval(Duration::ZERO)
            .with_heartbeat_interval(Duration::ZERO);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
    }

    #[test]
    fn debug_redacts_key() {
        let config = ServerConfig::new("hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
