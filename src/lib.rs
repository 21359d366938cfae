//! Client-side session and navigation guard for the finance app frontend.
//!
//! ARCHITECTURE
//! ============
//! Auth-state notifications from the identity provider flow through a
//! trailing-edge debouncer, a redirect policy, and a navigation guard that
//! rate-limits real navigations against a time-windowed reload ledger:
//!
//! ```text
//! identity provider -> AuthDebouncer -> RedirectPolicy -> NavigationGuard
//!                                                              |
//!                                          ReloadLedger (session storage)
//! ```
//!
//! The provider is known to re-fire notifications with no real change, and a
//! naive "if unverified, redirect" handler loops forever. Every layer here
//! exists to make that loop terminate: the debouncer coalesces bursts, the
//! policy gates each redirect path on cooldowns, and the guard caps executed
//! navigations per window no matter how often upstream logic asks.
//!
//! TIME
//! ====
//! All time-dependent operations take an explicit `now_ms` (milliseconds
//! since the Unix epoch) through `_at` variants so tests drive the clock;
//! public wrappers read the wall clock.

pub mod auth;
pub mod config;
pub mod debounce;
pub mod ledger;
pub mod navigate;
pub mod page;
pub mod policy;
pub mod session;
pub mod store;

pub use auth::{AuthSnapshot, IdentityProvider, ProviderError, UserDirectory, UserProfile};
pub use config::GuardConfig;
pub use debounce::{AuthDebouncer, DebouncePhase};
pub use ledger::ReloadLedger;
pub use navigate::{NavigateError, NavigationGuard, Navigator, Outcome, RedirectKind};
pub use page::{PageClass, PageContext};
pub use policy::{RedirectDecision, RedirectPolicy};
pub use session::SessionController;
pub use store::{MemoryStore, SessionStore};

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn epoch_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
