// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dashboard identity check.
//!
//! The dashboard only needs to know whether a request comes from an
//! authenticated owner. How that is decided is pluggable through
//! [`IdentityCheck`]; [`StaticKeyIdentity`] compares a shared bearer key.

use std::fmt;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// An authenticated dashboard user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Display name of the user.
    pub name: String,
}

impl Principal {
    /// Creates a principal with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Decides whether a request is authenticated.
pub trait IdentityCheck: Send + Sync + fmt::Debug {
    /// Returns the principal behind the request, or `None`.
    fn authenticate(&self, headers: &HeaderMap) -> Option<Principal>;
}

/// Accepts `Authorization: Bearer <key>` for one shared key.
pub struct StaticKeyIdentity {
    key: String,
}

impl StaticKeyIdentity {
    /// Creates the check for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Constant-time comparison against the configured key.
    fn matches(&self, candidate: &str) -> bool {
        if self.key.is_empty() || candidate.len() != self.key.len() {
            return false;
        }

        let mut diff = 0u8;
        for (a, b) in candidate.bytes().zip(self.key.bytes()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

impl IdentityCheck for StaticKeyIdentity {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Principal> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let candidate = value.strip_prefix("Bearer ")?.trim();

        if self.matches(candidate) {
            Some(Principal::new("owner"))
        } else {
            tracing::debug!("Rejected dashboard credentials");
            None
        }
    }
}

impl fmt::Debug for StaticKeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeyIdentity")
            .field("key", &"<redacted>")
            .finish()
    }
}
