// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curtain Closer server entry point.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use curtain_closer::server::{AppState, build_router};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Cli::parse().into_config();
    tracing::debug!(?config, "Configuration loaded");

    let state = AppState::from_config(&config).context("failed to load device configuration")?;
    let tasks = state.spawn_background_tasks(config.sweep_interval);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Curtain closer listening");

    let result = tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result.context("server error")
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
    };

    tasks.shutdown();
    result
}
