use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::*;
use crate::ledger::DEFAULT_WINDOW_MS;
use crate::store::MemoryStore;

const T0: u64 = 1_700_000_000_000;
const MAX: usize = 2;

/// Records every performed navigation; can fail the first N calls.
#[derive(Default)]
pub(crate) struct FakeNavigator {
    pub(crate) calls: Mutex<Vec<String>>,
    fail_first: AtomicUsize,
}

impl FakeNavigator {
    pub(crate) fn failing_first(n: usize) -> Self {
        let nav = Self::default();
        nav.fail_first.store(n, Ordering::SeqCst);
        nav
    }

    fn hit(&self, label: String) -> Result<(), NavigateError> {
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(NavigateError::new(Some(&label), "boom"));
        }
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(label);
        Ok(())
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl Navigator for FakeNavigator {
    fn replace(&self, url: &str) -> Result<(), NavigateError> {
        self.hit(format!("replace {url}"))
    }

    fn reload(&self) -> Result<(), NavigateError> {
        self.hit("reload".to_owned())
    }

    fn assign(&self, url: &str) -> Result<(), NavigateError> {
        self.hit(format!("assign {url}"))
    }
}

fn guard_with(navigator: Arc<FakeNavigator>) -> NavigationGuard {
    let store = Arc::new(MemoryStore::new());
    let ledger = ReloadLedger::new(store, DEFAULT_WINDOW_MS);
    NavigationGuard::new(navigator, ledger, DEFAULT_WINDOW_MS, MAX)
}

#[test]
fn executes_up_to_limit_then_blocks() {
    // At most 2 real navigations per window, however many attempts.
    let nav = Arc::new(FakeNavigator::default());
    let guard = guard_with(nav.clone());

    assert_eq!(guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0), Outcome::Executed);
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0 + 100), Outcome::Executed);
    for i in 0..10 {
        assert_eq!(
            guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0 + 200 + i),
            Outcome::Blocked,
            "attempt {i} should be blocked"
        );
    }
    assert_eq!(nav.call_count(), 2);
}

#[test]
fn blocked_outcome_does_not_navigate_or_record() {
    let nav = Arc::new(FakeNavigator::default());
    let store = Arc::new(MemoryStore::new());
    let ledger = ReloadLedger::new(store, DEFAULT_WINDOW_MS);
    let guard = NavigationGuard::new(nav.clone(), ledger.clone(), DEFAULT_WINDOW_MS, MAX);

    guard.attempt_redirect_at(RedirectKind::Replace, "index.html", T0);
    guard.attempt_redirect_at(RedirectKind::Replace, "index.html", T0 + 1);
    guard.attempt_redirect_at(RedirectKind::Replace, "index.html", T0 + 2);
    // The blocked attempt must not add to the history.
    assert_eq!(ledger.count_recent_at(DEFAULT_WINDOW_MS, T0 + 3), 2);
    assert_eq!(nav.call_count(), 2);
}

#[test]
fn forced_redirect_burst_sets_flag_and_recovers_after_window() {
    let nav = Arc::new(FakeNavigator::default());
    let store = Arc::new(MemoryStore::new());
    let ledger = ReloadLedger::new(store, DEFAULT_WINDOW_MS);
    let guard = NavigationGuard::new(nav.clone(), ledger.clone(), DEFAULT_WINDOW_MS, MAX);

    assert_eq!(guard.attempt_redirect_at(RedirectKind::Reload, "", T0), Outcome::Executed);
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Reload, "", T0 + 1_000), Outcome::Executed);
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Reload, "", T0 + 2_000), Outcome::Blocked);
    assert!(ledger.is_blocked_at(T0 + 2_000));
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Reload, "", T0 + 3_000), Outcome::Blocked);
    // 10+ seconds after the last recorded redirect everything has expired.
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Reload, "", T0 + 13_000), Outcome::Executed);
    assert_eq!(nav.call_count(), 3);
}

#[test]
fn still_blocked_while_flag_live_even_if_history_pruned() {
    let nav = Arc::new(FakeNavigator::default());
    let store = Arc::new(MemoryStore::new());
    let ledger = ReloadLedger::new(store, DEFAULT_WINDOW_MS);
    let guard = NavigationGuard::new(nav.clone(), ledger.clone(), DEFAULT_WINDOW_MS, MAX);

    ledger.set_blocked_at(T0 + 5_000);
    // No history at all, but the circuit breaker is live.
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0 + 6_000), Outcome::Blocked);
    // Flag expires window_ms after it was set.
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0 + 15_100), Outcome::Executed);
}

#[test]
fn failed_navigation_retries_once_with_absolute_path() {
    let nav = Arc::new(FakeNavigator::failing_first(1));
    let guard = guard_with(nav.clone());

    assert_eq!(guard.attempt_redirect_at(RedirectKind::Assign, "login.html", T0), Outcome::Executed);
    let calls = nav.calls.lock().unwrap();
    assert_eq!(calls.as_slice(), ["assign /login.html"]);
}

#[test]
fn navigation_failure_is_swallowed_after_retry() {
    let nav = Arc::new(FakeNavigator::failing_first(2));
    let guard = guard_with(nav.clone());

    // Both the attempt and the retry fail; the guard still reports Executed
    // (the budget was spent) and no error escapes.
    assert_eq!(guard.attempt_redirect_at(RedirectKind::Replace, "index.html", T0), Outcome::Executed);
    assert_eq!(nav.call_count(), 0);
}
