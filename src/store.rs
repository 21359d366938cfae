//! Session-scoped key/value storage.
//!
//! DESIGN
//! ======
//! The browser's `sessionStorage` is modeled as a narrow trait so every
//! component that persists state can be exercised without a real browser.
//! Each key has exactly one owning component: the ledger owns the reload
//! history and blocked flag, the policy owns the redirect cooldown flags.
//!
//! ERROR HANDLING
//! ==============
//! The trait is infallible by contract. Storage faults and malformed values
//! are swallowed at the implementation boundary (fail-open): blocking all
//! navigation forever because a flag failed to parse is strictly worse than
//! occasionally under-blocking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Reload timestamps, owned by [`crate::ledger::ReloadLedger`].
pub const RELOAD_HISTORY_KEY: &str = "reload-history";
/// Navigation circuit-breaker flag, owned by the ledger.
pub const RELOAD_BLOCKED_KEY: &str = "reload-blocked";
/// Epoch-ms instant the blocked flag was set; expiry is derived from it.
pub const RELOAD_BLOCKED_AT_KEY: &str = "reload-blocked-at";
/// One-shot guard against re-redirecting from the same auth page load.
pub const AUTH_REDIRECT_DONE_KEY: &str = "auth-redirect-done";
/// Epoch-ms cooldown timestamp for auth-page redirects.
pub const LAST_AUTH_REDIRECT_KEY: &str = "last-auth-redirect-time";
/// Hand-off flag letting a login-page-local redirect pre-empt the policy.
pub const LOGIN_HANDLING_REDIRECT_KEY: &str = "login-handling-redirect";

/// Session-scoped string storage. Values live until the session ends.
pub trait SessionStore: Send + Sync {
    /// Read a value, `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value, silently dropping storage faults.
    fn set(&self, key: &str, value: &str);
    /// Remove a value if present.
    fn remove(&self, key: &str);
}

/// In-memory session store. One instance per logical session.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
