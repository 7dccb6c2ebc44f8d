// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability token value type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque capability string.
///
/// Tokens carry no owner: whoever holds the string may exercise the
/// actions gated on it until it expires or is revoked. Generated tokens are
/// the 32 lowercase hex digits of a UUID v4, drawn from the operating
/// system's random source.
///
/// # Examples
///
/// ```
/// use curtain_closer::token::Token;
///
/// let token = Token::generate();
/// assert_eq!(token.as_str().len(), 32);
/// assert_ne!(token, Token::generate());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Generates a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only a prefix; the full value is a bearer credential
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "Token({short}...)")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
