//! Guard configuration loaded from environment variables.

const DEFAULT_WINDOW_MS: u64 = 10_000;
const DEFAULT_MAX_REDIRECTS_PER_WINDOW: usize = 2;
const DEFAULT_SETTLE_MS: u64 = 500;
const DEFAULT_NAV_DELAY_MS: u64 = 200;
const DEFAULT_REDIRECT_COOLDOWN_MS: u64 = 5_000;
const DEFAULT_AUTH_REDIRECT_WINDOW_MS: u64 = 10_000;
const DEFAULT_MAX_SETTLED_TRANSITIONS: u32 = 5;

/// Tuning knobs for the session guard, loaded from environment variables.
#[derive(Clone, Debug)]
pub struct GuardConfig {
    /// Sliding window for the reload ledger and the blocked flag, in ms.
    pub window_ms: u64,
    /// Executed navigations allowed per window before the guard trips.
    pub max_redirects_per_window: usize,
    /// Trailing-edge debounce window for auth notifications, in ms.
    pub settle_ms: u64,
    /// Delay before invoking a real navigation, so two competing redirect
    /// calls cannot race within one event-loop turn. In ms.
    pub nav_delay_ms: u64,
    /// Minimum gap between auth-page redirects, in ms.
    pub redirect_cooldown_ms: u64,
    /// Window for the stricter one-per-window auth-page redirect gate, in ms.
    pub auth_redirect_window_ms: u64,
    /// Settled transitions tolerated per debouncer lifetime before the
    /// loop circuit breaker trips.
    pub max_settled_transitions: u32,
    /// Emails exempt from the verified-email requirement (lowercased).
    pub allow_unverified_emails: Vec<String>,
    /// Blanket unverified-email exemption, honored on localhost only.
    pub allow_unverified_local: bool,
}

impl GuardConfig {
    /// Load from `AUTHGUARD_*` environment variables, falling back to the
    /// defaults above.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            window_ms: env_parse("AUTHGUARD_WINDOW_MS", DEFAULT_WINDOW_MS),
            max_redirects_per_window: env_parse(
                "AUTHGUARD_MAX_REDIRECTS_PER_WINDOW",
                DEFAULT_MAX_REDIRECTS_PER_WINDOW,
            ),
            settle_ms: env_parse("AUTHGUARD_SETTLE_MS", DEFAULT_SETTLE_MS),
            nav_delay_ms: env_parse("AUTHGUARD_NAV_DELAY_MS", DEFAULT_NAV_DELAY_MS),
            redirect_cooldown_ms: env_parse(
                "AUTHGUARD_REDIRECT_COOLDOWN_MS",
                DEFAULT_REDIRECT_COOLDOWN_MS,
            ),
            auth_redirect_window_ms: env_parse(
                "AUTHGUARD_AUTH_REDIRECT_WINDOW_MS",
                DEFAULT_AUTH_REDIRECT_WINDOW_MS,
            ),
            max_settled_transitions: env_parse(
                "AUTHGUARD_MAX_SETTLED_TRANSITIONS",
                DEFAULT_MAX_SETTLED_TRANSITIONS,
            ),
            allow_unverified_emails: parse_email_list(
                &std::env::var("AUTHGUARD_ALLOW_UNVERIFIED_EMAILS").unwrap_or_default(),
            ),
            allow_unverified_local: std::env::var("AUTHGUARD_ALLOW_UNVERIFIED_LOCAL")
                .is_ok_and(|v| v == "true"),
        }
    }

    /// Whether `email` may sign in unverified.
    #[must_use]
    pub fn email_allow_listed(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.allow_unverified_emails.iter().any(|e| *e == email)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            max_redirects_per_window: DEFAULT_MAX_REDIRECTS_PER_WINDOW,
            settle_ms: DEFAULT_SETTLE_MS,
            nav_delay_ms: DEFAULT_NAV_DELAY_MS,
            redirect_cooldown_ms: DEFAULT_REDIRECT_COOLDOWN_MS,
            auth_redirect_window_ms: DEFAULT_AUTH_REDIRECT_WINDOW_MS,
            max_settled_transitions: DEFAULT_MAX_SETTLED_TRANSITIONS,
            allow_unverified_emails: Vec::new(),
            allow_unverified_local: false,
        }
    }
}

/// Parse a comma-separated email allow-list: trim, lowercase, drop empties.
#[must_use]
pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
