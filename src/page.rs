//! Page classification from the current location.

/// How the redirect policy treats the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageClass {
    /// Login, register, or password-reset page.
    AuthPage,
    /// Page that requires a signed-in user.
    ProtectedPage,
    /// Everything else (landing page, static content).
    Other,
}

// Exact literal sets. Extend by editing these tables, not by config.
const AUTH_PAGES: &[&str] = &["login.html", "register.html", "reset.html"];
const PROTECTED_PAGES: &[&str] = &[
    "dashboard.html",
    "budget.html",
    "debt-tracker.html",
    "velocity-calculator.html",
];

/// The current location, as seen by the policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageContext {
    /// Hostname, e.g. `"app.example.com"` or `"localhost"`.
    pub host: String,
    /// URL path, e.g. `"/dashboard.html"`.
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    /// Classify by the trailing path segment.
    #[must_use]
    pub fn classify(&self) -> PageClass {
        let page = self.path.rsplit('/').next().unwrap_or("");
        if AUTH_PAGES.contains(&page) {
            PageClass::AuthPage
        } else if PROTECTED_PAGES.contains(&page) {
            PageClass::ProtectedPage
        } else {
            PageClass::Other
        }
    }

    /// Whether this session runs against a local dev host. Feeds the
    /// localhost-only unverified-email override.
    #[must_use]
    pub fn is_localhost(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "[::1]")
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
