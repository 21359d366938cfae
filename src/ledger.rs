//! Reload history ledger — sliding-window log of redirect timestamps.
//!
//! DESIGN
//! ======
//! An append-only, time-windowed list of epoch-millisecond timestamps
//! persisted under `reload-history`, plus a self-expiring blocked flag.
//! Answers one question for the navigation guard: have we redirected too
//! many times recently? The persisted list never contains entries older
//! than the window after any write.
//!
//! The original cleared the blocked flag with an ambient timer; here expiry
//! is derived from a persisted set-time (`reload-blocked-at`) so the flag
//! survives page loads and needs no background task.
//!
//! ERROR HANDLING
//! ==============
//! Malformed JSON reads as empty history and a bad set-time reads as
//! expired. Fail-open throughout: under-blocking is recoverable, a wedged
//! blocked flag is not.

use std::sync::Arc;

use tracing::debug;

use crate::epoch_ms_now;
use crate::store::{RELOAD_BLOCKED_AT_KEY, RELOAD_BLOCKED_KEY, RELOAD_HISTORY_KEY, SessionStore};

/// Default sliding window for redirect counting, in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 10_000;

/// Time-windowed redirect history over a session store.
#[derive(Clone)]
pub struct ReloadLedger {
    store: Arc<dyn SessionStore>,
    window_ms: u64,
}

impl ReloadLedger {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, window_ms: u64) -> Self {
        Self { store, window_ms }
    }

    /// Append the current timestamp, prune, persist, and return the new
    /// in-window count.
    pub fn record_redirect(&self) -> usize {
        self.record_redirect_at(epoch_ms_now())
    }

    pub(crate) fn record_redirect_at(&self, now_ms: u64) -> usize {
        let mut history = self.read_history();
        history.push(now_ms);
        history.retain(|&ts| now_ms.saturating_sub(ts) < self.window_ms);
        match serde_json::to_string(&history) {
            Ok(json) => self.store.set(RELOAD_HISTORY_KEY, &json),
            Err(_) => self.store.remove(RELOAD_HISTORY_KEY),
        }
        history.len()
    }

    /// Count entries within `window_ms` of now. Non-mutating.
    #[must_use]
    pub fn count_recent(&self, window_ms: u64) -> usize {
        self.count_recent_at(window_ms, epoch_ms_now())
    }

    pub(crate) fn count_recent_at(&self, window_ms: u64, now_ms: u64) -> usize {
        self.read_history()
            .iter()
            .filter(|&&ts| now_ms.saturating_sub(ts) < window_ms)
            .count()
    }

    /// Whether the navigation guard's circuit-breaker flag is live.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_blocked_at(epoch_ms_now())
    }

    pub(crate) fn is_blocked_at(&self, now_ms: u64) -> bool {
        if self.store.get(RELOAD_BLOCKED_KEY).as_deref() != Some("true") {
            return false;
        }
        let Some(set_at) = self
            .store
            .get(RELOAD_BLOCKED_AT_KEY)
            .and_then(|v| v.parse::<u64>().ok())
        else {
            // Unreadable set-time: treat as expired and clear.
            self.clear_blocked();
            return false;
        };
        if now_ms.saturating_sub(set_at) >= self.window_ms {
            self.clear_blocked();
            return false;
        }
        true
    }

    /// Set the blocked flag; it expires `window_ms` after `now_ms`.
    pub(crate) fn set_blocked_at(&self, now_ms: u64) {
        debug!(now_ms, "reload guard blocked flag set");
        self.store.set(RELOAD_BLOCKED_KEY, "true");
        self.store.set(RELOAD_BLOCKED_AT_KEY, &now_ms.to_string());
    }

    fn clear_blocked(&self) {
        self.store.remove(RELOAD_BLOCKED_KEY);
        self.store.remove(RELOAD_BLOCKED_AT_KEY);
    }

    fn read_history(&self) -> Vec<u64> {
        self.store
            .get(RELOAD_HISTORY_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
