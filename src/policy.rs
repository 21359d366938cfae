//! Session redirect policy — decides what a settled auth state means for
//! the current page.
//!
//! DESIGN
//! ======
//! `decide_at` is a pure function of the settled snapshot, the page
//! classification, and read-only consultation of the ledger and cooldown
//! flags. First matching rule wins:
//!
//! 1. signed out on a protected page -> redirect to login (at most once per
//!    window: this path runs on first paint of every protected page)
//! 2. signed out on an auth page -> nothing (a login page must never
//!    redirect away a signed-out visitor, or login loops with itself)
//! 3. signed in but unverified and not allow-listed -> sign out
//! 4. signed in on an auth page -> redirect to the app, behind a cooldown
//!    gate, the blocked flag, a strict one-per-window gate, a one-shot
//!    per-page-load flag, and the login page's own hand-off flag
//! 5. otherwise nothing
//!
//! The 5-second cooldown and the one-per-10-second window in rule 4 are
//! deliberately independent gates; both are checked.
//!
//! ERROR HANDLING
//! ==============
//! The decision path cannot fail: every flag read falls back to "absent" and
//! every ledger read falls back to empty. A decision error must never cause
//! an uncontrolled redirect, so anything fallible lives in execution, where
//! it degrades to `RedirectDecision::None`.

use std::sync::Arc;

use tracing::debug;

use crate::auth::AuthSnapshot;
use crate::config::GuardConfig;
use crate::epoch_ms_now;
use crate::ledger::ReloadLedger;
use crate::page::{PageClass, PageContext};
use crate::store::{
    AUTH_REDIRECT_DONE_KEY, LAST_AUTH_REDIRECT_KEY, LOGIN_HANDLING_REDIRECT_KEY, SessionStore,
};

/// What to do about a settled auth state. Recomputed per transition, never
/// persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Stay put.
    None,
    /// Sign the user out (unverified email) and send them to login.
    SignOutUnverified,
    /// Send a signed-in user from an auth page into the app.
    RedirectToApp,
    /// Send a signed-out visitor from a protected page to login.
    RedirectToLogin,
}

/// Redirect decision logic plus ownership of the policy's cooldown flags.
#[derive(Clone)]
pub struct RedirectPolicy {
    config: GuardConfig,
    ledger: ReloadLedger,
    store: Arc<dyn SessionStore>,
}

impl RedirectPolicy {
    #[must_use]
    pub fn new(config: GuardConfig, ledger: ReloadLedger, store: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            ledger,
            store,
        }
    }

    /// Decide for a settled snapshot on the given page.
    #[must_use]
    pub fn decide(&self, snapshot: &AuthSnapshot, page: &PageContext) -> RedirectDecision {
        self.decide_at(snapshot, page, epoch_ms_now())
    }

    pub(crate) fn decide_at(
        &self,
        snapshot: &AuthSnapshot,
        page: &PageContext,
        now_ms: u64,
    ) -> RedirectDecision {
        let class = page.classify();

        // Rule 1: signed out on a protected page.
        if snapshot.user_id.is_none() && class == PageClass::ProtectedPage {
            if self.ledger.count_recent_at(self.config.window_ms, now_ms) < 1 {
                return RedirectDecision::RedirectToLogin;
            }
            debug!("login redirect suppressed: one already issued this window");
            return RedirectDecision::None;
        }

        // Rule 2: signed out on an auth page. Never redirect, whatever the
        // ledger says.
        if snapshot.user_id.is_none() && class == PageClass::AuthPage {
            return RedirectDecision::None;
        }

        // Rule 3: signed in but unverified, with no exemption.
        if snapshot.user_id.is_some()
            && !snapshot.email_verified
            && !self.unverified_exempt(snapshot, page)
        {
            return RedirectDecision::SignOutUnverified;
        }

        // Rule 4: signed in on an auth page.
        if snapshot.user_id.is_some() && class == PageClass::AuthPage {
            if self.auth_redirect_gates_open(now_ms) {
                return RedirectDecision::RedirectToApp;
            }
            return RedirectDecision::None;
        }

        RedirectDecision::None
    }

    fn unverified_exempt(&self, snapshot: &AuthSnapshot, page: &PageContext) -> bool {
        if page.is_localhost() && self.config.allow_unverified_local {
            return true;
        }
        snapshot
            .email
            .as_deref()
            .is_some_and(|email| self.config.email_allow_listed(email))
    }

    /// All gates on the auth-page-to-app redirect. The cooldown and the
    /// window are checked independently.
    fn auth_redirect_gates_open(&self, now_ms: u64) -> bool {
        if self.flag_set(LOGIN_HANDLING_REDIRECT_KEY) {
            debug!("app redirect suppressed: login page is handling it");
            return false;
        }
        if self.flag_set(AUTH_REDIRECT_DONE_KEY) {
            debug!("app redirect suppressed: already redirected this page load");
            return false;
        }
        if let Some(last) = self.last_auth_redirect_ms() {
            if now_ms.saturating_sub(last) < self.config.redirect_cooldown_ms {
                debug!("app redirect suppressed: within cooldown");
                return false;
            }
            if now_ms.saturating_sub(last) < self.config.auth_redirect_window_ms {
                debug!("app redirect suppressed: one already issued this window");
                return false;
            }
        }
        if self.ledger.is_blocked_at(now_ms) {
            debug!("app redirect suppressed: reload guard blocked");
            return false;
        }
        true
    }

    /// Stamp the cooldown timestamp and the one-shot flag. Called by the
    /// controller when it executes an auth-page redirect.
    pub(crate) fn note_auth_redirect_at(&self, now_ms: u64) {
        self.store.set(LAST_AUTH_REDIRECT_KEY, &now_ms.to_string());
        self.store.set(AUTH_REDIRECT_DONE_KEY, "true");
    }

    /// Clear the one-shot flag at the start of a page load. The flag only
    /// guards against re-redirecting within a single load.
    pub(crate) fn reset_page_load_flags(&self) {
        self.store.remove(AUTH_REDIRECT_DONE_KEY);
    }

    fn last_auth_redirect_ms(&self) -> Option<u64> {
        self.store
            .get(LAST_AUTH_REDIRECT_KEY)
            .and_then(|v| v.parse::<u64>().ok())
    }

    fn flag_set(&self, key: &str) -> bool {
        self.store.get(key).as_deref() == Some("true")
    }
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
