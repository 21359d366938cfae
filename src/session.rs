//! Session controller — wires provider notifications through the debouncer,
//! policy, and navigation guard.
//!
//! ARCHITECTURE
//! ============
//! One controller per page load. Raw notifications feed the debouncer; a
//! periodic tick drains settled transitions; each settled transition gets
//! one decision and one (guarded) execution. A configured delay sits in
//! front of every real navigation so two competing redirect calls cannot
//! race within the same event-loop turn.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here propagates. Sign-out failures are logged and treated as
//! success (retrying risks the redirect loop this crate prevents), profile
//! bootstrap failures are logged and skipped, and navigation failures are
//! handled inside the guard. A decision that cannot be executed degrades to
//! a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::{AuthSnapshot, IdentityProvider, UserDirectory, UserProfile};
use crate::config::GuardConfig;
use crate::debounce::AuthDebouncer;
use crate::epoch_ms_now;
use crate::ledger::ReloadLedger;
use crate::navigate::{NavigationGuard, Navigator, Outcome, RedirectKind};
use crate::page::PageContext;
use crate::policy::{RedirectDecision, RedirectPolicy};
use crate::store::SessionStore;

const APP_TARGET: &str = "index.html";
const LOGIN_TARGET: &str = "login.html";
const UNVERIFIED_TARGET: &str = "login.html?error=Please verify your email first";

/// How often the event loop checks for a settled transition, in ms.
const TICK_MS: u64 = 50;

/// Per-page-load session guard orchestration.
pub struct SessionController {
    config: GuardConfig,
    page: PageContext,
    debouncer: AuthDebouncer,
    policy: RedirectPolicy,
    guard: NavigationGuard,
    provider: Arc<dyn IdentityProvider>,
    directory: Arc<dyn UserDirectory>,
    /// Re-entrancy sentinel: held from debounce-fire to the end of the
    /// transition's async chain. A settled transition arriving while one is
    /// in flight is a no-op.
    processing: bool,
}

impl SessionController {
    #[must_use]
    pub fn new(
        config: GuardConfig,
        page: PageContext,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let ledger = ReloadLedger::new(store.clone(), config.window_ms);
        let policy = RedirectPolicy::new(config.clone(), ledger.clone(), store);
        // Fresh page load: the one-shot redirect flag belongs to the
        // previous load.
        policy.reset_page_load_flags();
        let guard = NavigationGuard::new(
            navigator,
            ledger,
            config.window_ms,
            config.max_redirects_per_window,
        );
        let debouncer = AuthDebouncer::new(config.settle_ms, config.max_settled_transitions);
        Self {
            config,
            page,
            debouncer,
            policy,
            guard,
            provider,
            directory,
            processing: false,
        }
    }

    /// Drive the controller until the notification channel closes.
    pub async fn run(mut self, mut notifications: mpsc::Receiver<AuthSnapshot>) {
        info!(page = %self.page.path, "session controller running");
        let mut tick = tokio::time::interval(Duration::from_millis(TICK_MS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                maybe = notifications.recv() => {
                    let Some(snapshot) = maybe else { break };
                    self.handle_notification_at(snapshot, epoch_ms_now());
                }
                _ = tick.tick() => {
                    if let Some(settled) = self.debouncer.poll_at(epoch_ms_now()) {
                        self.process_settled_at(settled, epoch_ms_now()).await;
                    }
                }
            }
        }
        debug!("notification stream closed, session controller stopping");
    }

    /// Feed a raw provider notification into the debouncer.
    pub fn handle_notification_at(&mut self, snapshot: AuthSnapshot, now_ms: u64) {
        self.debouncer.notify_at(snapshot, now_ms);
    }

    /// Drain a settled transition if one is due.
    pub fn poll_settled_at(&mut self, now_ms: u64) -> Option<AuthSnapshot> {
        self.debouncer.poll_at(now_ms)
    }

    /// Decide and execute for a settled snapshot.
    pub async fn process_settled_at(&mut self, snapshot: AuthSnapshot, now_ms: u64) {
        if self.processing {
            warn!("settled transition ignored: previous transition still in flight");
            return;
        }
        self.processing = true;
        let decision = self.policy.decide_at(&snapshot, &self.page, now_ms);
        debug!(?decision, user = ?snapshot.user_id, "settled auth transition");
        self.execute(decision, &snapshot, now_ms).await;
        self.processing = false;
    }

    async fn execute(&mut self, decision: RedirectDecision, snapshot: &AuthSnapshot, now_ms: u64) {
        match decision {
            RedirectDecision::None => {
                if snapshot.user_id.is_some() && snapshot.email_verified {
                    self.bootstrap_profile(snapshot).await;
                }
            }
            RedirectDecision::SignOutUnverified => {
                info!(email = ?snapshot.email, "signing out unverified account");
                if let Err(e) = self.provider.sign_out().await {
                    // Proceed as if sign-out succeeded; retrying risks the
                    // redirect loop.
                    warn!(error = %e, "sign-out failed, continuing to login");
                }
                self.redirect(RedirectKind::Assign, UNVERIFIED_TARGET, now_ms).await;
            }
            RedirectDecision::RedirectToApp => {
                self.policy.note_auth_redirect_at(now_ms);
                self.redirect(RedirectKind::Replace, APP_TARGET, now_ms).await;
            }
            RedirectDecision::RedirectToLogin => {
                self.redirect(RedirectKind::Assign, LOGIN_TARGET, now_ms).await;
            }
        }
    }

    async fn redirect(&self, kind: RedirectKind, target: &str, now_ms: u64) {
        // Let the current event-loop turn finish before touching the
        // location; competing redirect calls must not race.
        if self.config.nav_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.nav_delay_ms)).await;
        }
        match self.guard.attempt_redirect_at(kind, target, now_ms) {
            Outcome::Executed => info!(target, "redirect executed"),
            Outcome::Blocked => debug!(target, "redirect blocked by reload guard"),
        }
    }

    /// First sign-in creates the profile document; later sign-ins stamp
    /// `last_login`. Failures are logged and skipped.
    async fn bootstrap_profile(&self, snapshot: &AuthSnapshot) {
        let Some(user_id) = snapshot.user_id.as_deref() else {
            return;
        };
        let email = snapshot.email.clone().unwrap_or_default();
        let now = time::OffsetDateTime::now_utc();
        let profile = match self.directory.fetch_profile(user_id).await {
            Ok(Some(mut existing)) => {
                existing.touch_login(now);
                existing
            }
            Ok(None) => UserProfile::new(email, now),
            Err(e) => {
                warn!(error = %e, user_id, "profile fetch failed, skipping bootstrap");
                return;
            }
        };
        if let Err(e) = self.directory.store_profile(user_id, &profile).await {
            warn!(error = %e, user_id, "profile write failed");
        }
    }

    #[cfg(test)]
    pub(crate) fn set_processing_for_test(&mut self, value: bool) {
        self.processing = value;
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
