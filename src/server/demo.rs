// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Token-gated demo controls.

use axum::Json;
use axum::extract::{Form, Query, State};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::clock::Timestamp;
use crate::device::{CurtainAction, Dispatch};
use crate::error::Error;

/// Query string of the controls page.
#[derive(Debug, Deserialize)]
pub struct ControlsQuery {
    token: Option<String>,
}

/// Token check result for the controls page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
    token: String,
    expires_at: Option<Timestamp>,
}

/// Form posted by the open/close buttons.
#[derive(Debug, Deserialize)]
pub struct ControlsForm {
    token: Option<String>,
    action: Option<String>,
}

/// `GET /demo/controls?token=`
pub async fn show_controls(
    State(state): State<AppState>,
    Query(query): Query<ControlsQuery>,
) -> Result<Json<ControlsView>, ApiError> {
    state.links.authorize(query.token.as_deref())?;

    // authorize() rejects absent tokens, so this is always Some here.
    let token = query.token.unwrap_or_default();
    let expires_at = state.links.registry().expires_at(&token);

    Ok(Json(ControlsView { token, expires_at }))
}

/// `POST /demo/controls`
pub async fn perform_action(
    State(state): State<AppState>,
    Form(form): Form<ControlsForm>,
) -> Result<Json<Dispatch>, ApiError> {
    // Token errors win over a bad action, so authorize before parsing.
    state.links.authorize(form.token.as_deref())?;

    let action: CurtainAction = form
        .action
        .as_deref()
        .ok_or_else(|| Error::UnknownAction(String::new()))?
        .parse()?;

    let dispatch = state.links.controller().trigger(action)?;
    Ok(Json(dispatch))
}
