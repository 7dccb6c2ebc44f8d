// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Owner dashboard: token management, test events and device settings.
//!
//! Every handler here requires an authenticated [`Principal`]; anonymous
//! requests are redirected to the login page.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Form, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use super::error::ApiError;
use super::identity::Principal;
use crate::broadcast::channel;
use crate::clock::Timestamp;
use crate::device::DeviceConfig;
use crate::error::Error;
use crate::token::{Token, TokenEntry};

/// Where anonymous dashboard requests are sent.
pub const LOGIN_PATH: &str = "/login";

const FORWARDED_PROTO: &str = "x-forwarded-proto";

fn require_identity(state: &AppState, headers: &HeaderMap) -> Result<Principal, Response> {
    state
        .identity
        .authenticate(headers)
        .ok_or_else(|| Redirect::to(LOGIN_PATH).into_response())
}

/// Origin demo links are built under.
fn link_origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(origin) = &state.public_origin {
        return origin.clone();
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /`
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    if state.identity.authenticate(&headers).is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

/// Dashboard listing.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    tokens: Vec<TokenEntry>,
}

/// `GET /dashboard`
pub async fn show_dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(redirect) = require_identity(&state, &headers) {
        return redirect;
    }

    Json(DashboardView {
        tokens: state.links.tokens(),
    })
    .into_response()
}

/// Form posted by the dashboard buttons.
#[derive(Debug, Deserialize)]
pub struct DashboardForm {
    action: Option<String>,
    token: Option<String>,
}

/// Result of a dashboard action.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DashboardOutcome {
    /// A demo link was issued.
    #[serde(rename_all = "camelCase")]
    LinkCreated {
        /// Always `create-demo-link`.
        action: &'static str,
        /// Link to the controls page.
        url: String,
        /// The token inside the link.
        token: Token,
        /// When the token expires.
        expires_at: Timestamp,
    },
    /// A token was renewed.
    #[serde(rename_all = "camelCase")]
    Extended {
        /// Always `extend`.
        action: &'static str,
        /// The token's new expiry.
        new_expiry: Timestamp,
    },
    /// An action without further output.
    Done {
        /// The action that ran.
        action: &'static str,
    },
}

/// `POST /dashboard`
pub async fn dashboard_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<DashboardForm>,
) -> Response {
    let principal = match require_identity(&state, &headers) {
        Ok(principal) => principal,
        Err(redirect) => return redirect,
    };

    match run_dashboard_action(&state, &headers, form) {
        Ok(outcome) => {
            tracing::debug!(user = %principal.name, ?outcome, "Dashboard action");
            Json(outcome).into_response()
        }
        Err(err) => err.into_response(),
    }
}

fn run_dashboard_action(
    state: &AppState,
    headers: &HeaderMap,
    form: DashboardForm,
) -> Result<DashboardOutcome, ApiError> {
    let token = || {
        form.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)
    };

    match form.action.as_deref().unwrap_or_default() {
        "create-demo-link" => {
            let link = state.links.create_link(&link_origin(state, headers));
            Ok(DashboardOutcome::LinkCreated {
                action: "create-demo-link",
                url: link.url,
                token: link.token,
                expires_at: link.expires_at,
            })
        }
        "revoke" => {
            state.links.revoke(token()?);
            Ok(DashboardOutcome::Done { action: "revoke" })
        }
        "extend" => {
            let new_expiry = state.links.extend(token()?)?;
            Ok(DashboardOutcome::Extended {
                action: "extend",
                new_expiry,
            })
        }
        "send-event" => {
            let payload = format!("test:{}", Uuid::new_v4().simple());
            let delivered = state.broadcaster.publish_counted(channel::MESSAGE, &payload);
            tracing::info!(delivered, "Test event sent");
            Ok(DashboardOutcome::Done {
                action: "send-event",
            })
        }
        other => Err(Error::UnknownAction(other.to_string()).into()),
    }
}

/// `GET /api/device`
pub async fn get_device(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(redirect) = require_identity(&state, &headers) {
        return redirect;
    }

    match state.links.controller().store().get() {
        Some(config) => Json(config).into_response(),
        None => ApiError::from(Error::NoDeviceConfigured).into_response(),
    }
}

/// `PUT /api/device`
pub async fn put_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(redirect) = require_identity(&state, &headers) {
        return redirect;
    }

    let config: DeviceConfig = match serde_json::from_slice(&body) {
        Ok(config) => config,
        Err(e) => return ApiError::validation(e.to_string()).into_response(),
    };

    match state.links.controller().store().put(config.clone()) {
        Ok(()) => {
            tracing::info!(
                open_at = %config.open_at,
                close_at = %config.close_at,
                "Device configuration updated"
            );
            Json(config).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
