//! Navigator capability and the navigation guard.
//!
//! DESIGN
//! ======
//! The browser's navigation primitives are injected behind the [`Navigator`]
//! trait (the original monkey-patched `window.location`; a capability trait
//! makes the guard unit-testable without a browser). Every redirect attempt
//! passes through [`NavigationGuard`], which consults the reload ledger and
//! refuses to navigate once the per-window budget is spent. A refusal is a
//! no-op for the caller, never an error.
//!
//! ERROR HANDLING
//! ==============
//! A failed navigation is retried once with an absolute path, then dropped
//! with a log line. Nothing here propagates an error to the hosting page.

use std::sync::Arc;

use tracing::{error, warn};

use crate::epoch_ms_now;
use crate::ledger::ReloadLedger;

/// Which navigation primitive to invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectKind {
    /// Replace the current history entry.
    Replace,
    /// Reload the current page.
    Reload,
    /// Push a new history entry.
    Assign,
}

/// Result of a guarded redirect attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The navigation was performed.
    Executed,
    /// The guard refused; nothing navigated. Treat as a no-op.
    Blocked,
}

#[derive(Debug, thiserror::Error)]
#[error("navigation to {target:?} failed: {reason}")]
pub struct NavigateError {
    pub target: Option<String>,
    pub reason: String,
}

impl NavigateError {
    #[must_use]
    pub fn new(target: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            target: target.map(str::to_owned),
            reason: reason.into(),
        }
    }
}

/// Injected navigation capability.
pub trait Navigator: Send + Sync {
    /// Navigate, replacing the current history entry.
    fn replace(&self, url: &str) -> Result<(), NavigateError>;
    /// Reload the current page.
    fn reload(&self) -> Result<(), NavigateError>;
    /// Navigate, pushing a new history entry.
    fn assign(&self, url: &str) -> Result<(), NavigateError>;
}

/// Wraps a [`Navigator`] so every redirect is checked against the ledger.
#[derive(Clone)]
pub struct NavigationGuard {
    navigator: Arc<dyn Navigator>,
    ledger: ReloadLedger,
    window_ms: u64,
    max_per_window: usize,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(
        navigator: Arc<dyn Navigator>,
        ledger: ReloadLedger,
        window_ms: u64,
        max_per_window: usize,
    ) -> Self {
        Self {
            navigator,
            ledger,
            window_ms,
            max_per_window,
        }
    }

    /// Attempt a redirect. Records the attempt in the ledger and navigates,
    /// or returns [`Outcome::Blocked`] without touching the location.
    pub fn attempt_redirect(&self, kind: RedirectKind, target: &str) -> Outcome {
        self.attempt_redirect_at(kind, target, epoch_ms_now())
    }

    pub(crate) fn attempt_redirect_at(
        &self,
        kind: RedirectKind,
        target: &str,
        now_ms: u64,
    ) -> Outcome {
        let recent = self.ledger.count_recent_at(self.window_ms, now_ms);
        if recent >= self.max_per_window {
            warn!(
                recent,
                max = self.max_per_window,
                target,
                "too many redirects in window, blocking navigation"
            );
            self.ledger.set_blocked_at(now_ms);
            return Outcome::Blocked;
        }
        if self.ledger.is_blocked_at(now_ms) {
            warn!(target, "navigation currently blocked by reload guard");
            return Outcome::Blocked;
        }

        self.ledger.record_redirect_at(now_ms);
        self.navigate(kind, target);
        Outcome::Executed
    }

    fn navigate(&self, kind: RedirectKind, target: &str) {
        // Reload has no target to absolutize; nothing to retry.
        if kind == RedirectKind::Reload {
            if let Err(e) = self.navigator.reload() {
                error!(error = %e, "reload failed");
            }
            return;
        }

        let go = |url: &str| match kind {
            RedirectKind::Replace => self.navigator.replace(url),
            _ => self.navigator.assign(url),
        };
        let Err(e) = go(target) else { return };

        // One retry with an absolute path, then give up silently.
        let absolute = if target.starts_with('/') {
            target.to_owned()
        } else {
            format!("/{target}")
        };
        warn!(error = %e, retry = %absolute, "navigation failed, retrying with absolute path");
        if let Err(e) = go(&absolute) {
            error!(error = %e, target = %absolute, "navigation retry failed, giving up");
        }
    }
}

#[cfg(test)]
#[path = "navigate_test.rs"]
mod tests;
