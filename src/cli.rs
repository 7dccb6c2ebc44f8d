// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use curtain_closer::ExtendPolicy;
use curtain_closer::server::ServerConfig;

#[derive(Parser)]
#[command(name = "curtain-closer")]
#[command(about = "Remote control server for a motorized curtain", long_about = None)]
pub struct Cli {
    /// Address to bind to
    #[arg(long, env = "CURTAIN_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Shared key for the owner dashboard (sent as `Authorization: Bearer`)
    #[arg(long, env = "AUTHORIZATION_KEY", hide_env_values = true)]
    pub authorization_key: String,

    /// Origin used in demo links, e.g. https://curtain.example
    #[arg(long, env = "PUBLIC_ORIGIN")]
    pub public_origin: Option<String>,

    /// JSON file holding the device configuration
    #[arg(long, env = "CURTAIN_DEVICE_FILE")]
    pub device_file: Option<PathBuf>,

    /// Refuse to extend tokens that are unknown or expired
    #[arg(long, env = "CURTAIN_STRICT_EXTEND")]
    pub strict_extend: bool,

    /// Lifetime of demo tokens in seconds
    #[arg(long, env = "CURTAIN_TOKEN_TTL_SECS", default_value_t = 60)]
    pub token_ttl_secs: u64,

    /// Seconds between expired-token sweeps
    #[arg(
        long,
        env = "CURTAIN_SWEEP_INTERVAL_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    /// Seconds between heartbeat events on the event stream
    #[arg(
        long,
        env = "CURTAIN_HEARTBEAT_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub heartbeat_secs: u64,
}

impl Cli {
    /// Converts the parsed arguments into the server configuration.
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(self.authorization_key)
            .with_bind(self.bind)
            .with_extend_policy(if self.strict_extend {
                ExtendPolicy::Strict
            } else {
                ExtendPolicy::Lenient
            })
            .with_token_ttl(Duration::from_secs(self.token_ttl_secs))
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_secs));

        if let Some(origin) = self.public_origin {
            config = config.with_public_origin(origin);
        }
        if let Some(path) = self.device_file {
            config = config.with_device_file(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "curtain-closer",
            "--authorization-key",
            "k",
            "--bind",
            "127.0.0.1:8080",
            "--strict-extend",
            "--token-ttl-secs",
            "90",
            "--public-origin",
            "https://curtain.example",
        ])
        .unwrap();

        let config = cli.into_config();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.extend_policy, ExtendPolicy::Strict);
        assert_eq!(config.token_ttl, Duration::from_secs(90));
        assert_eq!(config.public_origin.as_deref(), Some("https://curtain.example"));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        for flag in ["--sweep-interval-secs", "--heartbeat-secs"] {
            let err = Cli::try_parse_from(["curtain-closer", "--authorization-key", "k", flag, "0"])
                .err()
                .unwrap_or_else(|| panic!("{flag} 0 was accepted"));
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
