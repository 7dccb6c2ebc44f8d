// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ephemeral capability tokens.
//!
//! A [`Token`] is a bare bearer credential with a short time-to-live. The
//! [`TokenRegistry`] issues, validates, renews and revokes tokens, and
//! [`spawn_sweeper`] periodically drops the ones nobody came back for.
//!
//! # Lifecycle
//!
//! ```text
//! create ──> ACTIVE ──extend──> ACTIVE
//!              │
//!              ├── expiry  ──> EXPIRED (evicted on validate or sweep)
//!              └── revoke  ──> REVOKED (removed immediately)
//! ```
//!
//! # Examples
//!
//! ```
//! use curtain_closer::token::TokenRegistry;
//!
//! let registry = TokenRegistry::new();
//! let token = registry.create();
//!
//! assert!(registry.validate(token.as_str()));
//! let new_expiry = registry.extend(token.as_str());
//! assert!(new_expiry.is_some());
//! ```

mod capability;
mod registry;
mod sweeper;

pub use capability::Token;
pub use registry::{DEFAULT_TOKEN_TTL, ExtendPolicy, TokenEntry, TokenRegistry};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, SweepConfig, spawn_sweeper};
