//! Auth-state debouncer — coalesces the provider's notification bursts.
//!
//! DESIGN
//! ======
//! The identity provider re-fires state-change notifications redundantly and
//! in rapid bursts. This is a trailing-edge debounce: each notification
//! (re)arms a settle timer and only the last snapshot of a burst is ever
//! emitted, because the last notification is the authoritative final state;
//! intermediate ones during the provider's internal retries are transient.
//!
//! A lifetime circuit breaker sits on top: once more than
//! `max_settled_transitions` transitions have been processed, the machine
//! enters `BlockedLoop` and discards every further notification. Recovery
//! requires constructing a fresh debouncer, which in the hosting app means a
//! full page load.

use tracing::{debug, warn};

use crate::auth::AuthSnapshot;

/// Externally visible phase of the debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebouncePhase {
    /// No notification in flight.
    Idle,
    /// A notification is waiting out the settle window.
    Settling,
    /// Loop circuit breaker tripped; all notifications are discarded.
    BlockedLoop,
}

enum State {
    Idle,
    Settling {
        pending: AuthSnapshot,
        deadline_ms: u64,
    },
    BlockedLoop,
}

/// Trailing-edge debouncer over the provider's notification stream.
pub struct AuthDebouncer {
    state: State,
    settle_ms: u64,
    max_settled: u32,
    settled_count: u32,
    /// User id of the last snapshot emitted downstream. `None` until the
    /// first emission; the inner `None` means "signed out".
    last_processed: Option<Option<String>>,
}

impl AuthDebouncer {
    #[must_use]
    pub fn new(settle_ms: u64, max_settled: u32) -> Self {
        Self {
            state: State::Idle,
            settle_ms,
            max_settled,
            settled_count: 0,
            last_processed: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> DebouncePhase {
        match self.state {
            State::Idle => DebouncePhase::Idle,
            State::Settling { .. } => DebouncePhase::Settling,
            State::BlockedLoop => DebouncePhase::BlockedLoop,
        }
    }

    /// Feed a raw provider notification.
    pub fn notify_at(&mut self, snapshot: AuthSnapshot, now_ms: u64) {
        match self.phase() {
            DebouncePhase::BlockedLoop => {
                debug!("auth notification discarded: loop breaker tripped");
            }
            DebouncePhase::Idle => {
                // The provider is known to re-fire with no real change; a
                // notification for the already-processed user is noise.
                if self
                    .last_processed
                    .as_ref()
                    .is_some_and(|last| *last == snapshot.user_id)
                {
                    debug!(user = ?snapshot.user_id, "auth notification dropped: no user change");
                    return;
                }
                self.state = State::Settling {
                    pending: snapshot,
                    deadline_ms: now_ms + self.settle_ms,
                };
            }
            DebouncePhase::Settling => {
                // Trailing edge: the newest snapshot supersedes the pending
                // one and the timer restarts.
                self.state = State::Settling {
                    pending: snapshot,
                    deadline_ms: now_ms + self.settle_ms,
                };
            }
        }
    }

    /// Emit the pending snapshot if its settle window has elapsed.
    ///
    /// Returns each settled transition exactly once. Trips the loop breaker
    /// instead of emitting once the lifetime budget is spent.
    pub fn poll_at(&mut self, now_ms: u64) -> Option<AuthSnapshot> {
        let State::Settling { deadline_ms, .. } = &self.state else {
            return None;
        };
        if now_ms < *deadline_ms {
            return None;
        }
        if self.settled_count >= self.max_settled {
            warn!(
                settled = self.settled_count,
                "too many auth transitions this page load, entering loop breaker"
            );
            self.state = State::BlockedLoop;
            return None;
        }
        let State::Settling { pending, .. } = std::mem::replace(&mut self.state, State::Idle) else {
            return None;
        };
        self.settled_count += 1;
        self.last_processed = Some(pending.user_id.clone());
        Some(pending)
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;
