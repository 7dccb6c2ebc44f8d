// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP error responses.
//!
//! Every handler failure becomes an [`ApiError`]: a status code plus a JSON
//! body with a stable `code` and a human-readable `message`. Storage
//! failures are logged server-side and answered with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

/// Structured error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    /// Response status.
    pub status: StatusCode,
    /// Response body.
    pub body: ErrorResponse,
}

impl ApiError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    /// A 400 response for malformed input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingToken => Self::new(StatusCode::BAD_REQUEST, "missing_token", "Token is required"),
            Error::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid token"),
            Error::UnknownAction(_) => {
                Self::new(StatusCode::BAD_REQUEST, "unknown_action", err.to_string())
            }
            Error::NoDeviceConfigured => Self::new(
                StatusCode::PRECONDITION_FAILED,
                "no_device_configured",
                "No device configured",
            ),
            Error::TokenNotFound => Self::new(StatusCode::NOT_FOUND, "token_not_found", "Token not found"),
            Error::Value(ref e) => Self::validation(e.to_string()),
            Error::Storage(ref e) => {
                tracing::error!(error = %e, "Device storage failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
