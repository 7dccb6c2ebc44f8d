// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory registry of live capability tokens.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use crate::clock::{Clock, SystemClock, Timestamp};

use super::Token;

/// Default time-to-live of an issued token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// How [`TokenRegistry::extend`] treats tokens it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtendPolicy {
    /// Unknown or expired tokens are re-inserted with a fresh TTL.
    #[default]
    Lenient,
    /// Unknown or expired tokens are left alone and `extend` returns `None`.
    Strict,
}

/// A live token and its expiry, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenEntry {
    /// The token string.
    pub token: Token,
    /// When the token stops being valid.
    pub expiry: Timestamp,
}

/// Registry of capability tokens and their expiry instants.
///
/// Expiry is enforced twice: [`validate`](Self::validate) evicts a stale
/// entry the moment it is presented, and [`sweep`](Self::sweep) (run
/// periodically by [`spawn_sweeper`](super::spawn_sweeper)) bounds memory
/// for tokens that are never presented again. An entry is expired when its
/// expiry is strictly earlier than now.
///
/// # Thread Safety
///
/// All operations take `&self` and are safe to call concurrently; the map
/// sits behind a `parking_lot::RwLock`.
///
/// # Examples
///
/// ```
/// use curtain_closer::token::TokenRegistry;
///
/// let registry = TokenRegistry::new();
/// let token = registry.create();
///
/// assert!(registry.validate(token.as_str()));
/// registry.revoke(token.as_str());
/// assert!(!registry.validate(token.as_str()));
/// ```
pub struct TokenRegistry {
    entries: RwLock<HashMap<Token, Timestamp>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    extend_policy: ExtendPolicy,
}

impl TokenRegistry {
    /// Creates an empty registry using the system clock and default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TOKEN_TTL,
            extend_policy: ExtendPolicy::default(),
        }
    }

    /// Uses the given clock instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the time-to-live applied on create and extend.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets how `extend` treats unknown tokens.
    #[must_use]
    pub fn with_extend_policy(mut self, policy: ExtendPolicy) -> Self {
        self.extend_policy = policy;
        self
    }

    /// Returns the configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the configured extend policy.
    #[must_use]
    pub fn extend_policy(&self) -> ExtendPolicy {
        self.extend_policy
    }

    fn fresh_expiry(&self) -> Timestamp {
        self.clock.now().saturating_add(self.ttl)
    }

    /// Issues a new token valid for one TTL from now.
    pub fn create(&self) -> Token {
        self.issue().token
    }

    /// Like [`create`](Self::create), also returning the expiry.
    pub fn issue(&self) -> TokenEntry {
        let token = Token::generate();
        let expiry = self.fresh_expiry();
        self.entries.write().insert(token.clone(), expiry);
        tracing::debug!(token = ?token, %expiry, "Issued token");
        TokenEntry { token, expiry }
    }

    /// Returns `true` if the token is present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn validate(&self, token: &str) -> bool {
        let key = Token::from(token);
        let now = self.clock.now();

        match self.entries.read().get(&key) {
            None => return false,
            Some(expiry) if !expiry.is_before(now) => return true,
            Some(_) => {}
        }

        // Re-check under the write lock: a concurrent extend may have
        // renewed the entry in between.
        let mut entries = self.entries.write();
        if entries.get(&key).is_some_and(|expiry| expiry.is_before(now)) {
            entries.remove(&key);
            tracing::debug!(token = ?key, "Evicted expired token on validation");
        }
        false
    }

    /// Removes the token. Does nothing if it is absent.
    pub fn revoke(&self, token: &str) {
        if self.entries.write().remove(&Token::from(token)).is_some() {
            tracing::debug!(token = ?Token::from(token), "Revoked token");
        }
    }

    /// Resets the token's expiry to one TTL from now and returns it.
    ///
    /// Under [`ExtendPolicy::Lenient`] an unknown or expired token is
    /// inserted as if it had just been issued, so this always returns
    /// `Some`. It therefore cannot be used to detect whether a token exists;
    /// use [`validate`](Self::validate) for that. Under
    /// [`ExtendPolicy::Strict`] unknown or expired tokens yield `None`.
    pub fn extend(&self, token: &str) -> Option<Timestamp> {
        let key = Token::from(token);
        let now = self.clock.now();
        let expiry = now.saturating_add(self.ttl);

        let mut entries = self.entries.write();
        let live = entries.get(&key).is_some_and(|e| !e.is_before(now));

        if !live && self.extend_policy == ExtendPolicy::Strict {
            entries.remove(&key);
            return None;
        }

        entries.insert(key, expiry);
        Some(expiry)
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expiry| !expiry.is_before(now));
        before - entries.len()
    }

    /// Returns the expiry of a token still present in the map.
    ///
    /// Stale entries that have not been evicted yet are reported as well.
    #[must_use]
    pub fn expires_at(&self, token: &str) -> Option<Timestamp> {
        self.entries.read().get(&Token::from(token)).copied()
    }

    /// Returns a snapshot of the live tokens, soonest expiry first.
    ///
    /// Expired entries are skipped but not evicted.
    #[must_use]
    pub fn list(&self) -> Vec<TokenEntry> {
        let now = self.clock.now();
        let mut live: Vec<TokenEntry> = self
            .entries
            .read()
            .iter()
            .filter(|(_, expiry)| !expiry.is_before(now))
            .map(|(token, expiry)| TokenEntry {
                token: token.clone(),
                expiry: *expiry,
            })
            .collect();
        live.sort_by(|a, b| a.expiry.cmp(&b.expiry).then_with(|| a.token.cmp(&b.token)));
        live
    }

    /// Returns the number of entries, including stale ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .field("extend_policy", &self.extend_policy)
            .finish_non_exhaustive()
    }
}
