// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shareable demo links.
//!
//! A demo link is a URL carrying a fresh token. Whoever holds it can open
//! and close the curtain until the token expires or is revoked.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use curtain_closer::broadcast::Broadcaster;
//! use curtain_closer::demo::DemoLinks;
//! use curtain_closer::device::{CurtainAction, CurtainController, DeviceConfig, InMemoryDeviceStore};
//! use curtain_closer::token::TokenRegistry;
//!
//! let store = Arc::new(InMemoryDeviceStore::with_config(DeviceConfig::new(3, 3)));
//! let controller = CurtainController::new(store, Broadcaster::new());
//! let links = DemoLinks::new(Arc::new(TokenRegistry::new()), controller);
//!
//! let link = links.create_link("https://curtain.example");
//! assert!(link.url.starts_with("https://curtain.example/demo/controls?token="));
//!
//! let dispatch = links.perform(Some(link.token.as_str()), CurtainAction::Close).unwrap();
//! assert_eq!(dispatch.command.payload(), "rotate:-3");
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Timestamp;
use crate::device::{CurtainAction, CurtainController, Dispatch};
use crate::error::{Error, Result};
use crate::token::{ExtendPolicy, Token, TokenEntry, TokenRegistry};

/// Path of the token-gated controls page.
pub const CONTROLS_PATH: &str = "/demo/controls";

/// A freshly issued demo link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoLink {
    /// The token embedded in the link.
    pub token: Token,
    /// Full URL of the controls page.
    pub url: String,
    /// When the token expires unless extended.
    pub expires_at: Timestamp,
}

/// Issues demo links and performs token-gated curtain actions.
#[derive(Debug, Clone)]
pub struct DemoLinks {
    registry: Arc<TokenRegistry>,
    controller: CurtainController,
}

impl DemoLinks {
    /// Creates the workflow over a shared registry and controller.
    #[must_use]
    pub fn new(registry: Arc<TokenRegistry>, controller: CurtainController) -> Self {
        Self {
            registry,
            controller,
        }
    }

    /// Returns the token registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    /// Returns the curtain controller.
    #[must_use]
    pub fn controller(&self) -> &CurtainController {
        &self.controller
    }

    /// Issues a token and builds its link under `origin`.
    ///
    /// A trailing slash on `origin` is ignored.
    pub fn create_link(&self, origin: &str) -> DemoLink {
        let TokenEntry {
            token,
            expiry: expires_at,
        } = self.registry.issue();
        let url = format!(
            "{}{CONTROLS_PATH}?token={}",
            origin.trim_end_matches('/'),
            urlencoding::encode(token.as_str())
        );

        tracing::info!(?token, %expires_at, "Demo link created");

        DemoLink {
            token,
            url,
            expires_at,
        }
    }

    /// Checks that `token` is present and live.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingToken` for an absent or empty token and
    /// `Error::InvalidToken` if it is unknown, revoked or expired.
    pub fn authorize(&self, token: Option<&str>) -> Result<()> {
        let token = token.filter(|t| !t.is_empty()).ok_or(Error::MissingToken)?;
        if self.registry.validate(token) {
            Ok(())
        } else {
            tracing::debug!("Rejected demo token");
            Err(Error::InvalidToken)
        }
    }

    /// Authorizes `token`, then performs `action` on the device.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authorize`](Self::authorize) and
    /// `Error::NoDeviceConfigured` when no device exists.
    pub fn perform(&self, token: Option<&str>, action: CurtainAction) -> Result<Dispatch> {
        self.authorize(token)?;
        self.controller.trigger(action)
    }

    /// Revokes `token`. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        self.registry.revoke(token);
    }

    /// Renews `token` and returns its new expiry.
    ///
    /// # Errors
    ///
    /// Returns `Error::TokenNotFound` when the registry uses
    /// [`ExtendPolicy::Strict`] and the token is not live.
    pub fn extend(&self, token: &str) -> Result<Timestamp> {
        match self.registry.extend(token) {
            Some(expiry) => Ok(expiry),
            None => {
                debug_assert_eq!(self.registry.extend_policy(), ExtendPolicy::Strict);
                Err(Error::TokenNotFound)
            }
        }
    }

    /// Lists live tokens.
    #[must_use]
    pub fn tokens(&self) -> Vec<TokenEntry> {
        self.registry.list()
    }
}
