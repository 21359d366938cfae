//! Auth snapshots and the identity-provider seam.
//!
//! The provider (a hosted auth/database service) is an external collaborator:
//! it pushes [`AuthSnapshot`] notifications on every sign-in, sign-out, and
//! token refresh, exposes a sign-out call, and stores one profile document
//! per user in an opaque key-value collection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// The provider's belief about the current user at a point in time.
///
/// Ephemeral: replaced wholesale on each notification, consumed at most once
/// per settled transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Provider-assigned user id; `None` when signed out.
    pub user_id: Option<String>,
    /// Account email, if the provider knows one.
    pub email: Option<String>,
    /// Whether the provider has verified the account email.
    pub email_verified: bool,
}

impl AuthSnapshot {
    /// Snapshot for a signed-out session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            user_id: None,
            email: None,
            email_verified: false,
        }
    }

    /// Snapshot for a signed-in user.
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: Some(email.into()),
            email_verified,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider call failed: {0}")]
    Provider(String),
    #[error("profile document malformed: {0}")]
    Profile(#[from] serde_json::Error),
}

/// Sign-out capability of the identity provider.
///
/// Errors are logged and swallowed by callers: retrying a failed sign-out
/// risks the redirect-loop failure mode this crate exists to prevent.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Per-user profile document, keyed by user id in the provider's store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account email at first sign-in.
    pub email: String,
    /// RFC 3339 instant of the first sign-in.
    pub joined: String,
    /// RFC 3339 instant of the most recent sign-in.
    #[serde(rename = "lastLogin")]
    pub last_login: String,
}

impl UserProfile {
    /// Fresh profile for a first sign-in.
    #[must_use]
    pub fn new(email: impl Into<String>, now: OffsetDateTime) -> Self {
        let stamp = rfc3339(now);
        Self {
            email: email.into(),
            joined: stamp.clone(),
            last_login: stamp,
        }
    }

    /// Stamp a repeat sign-in.
    pub fn touch_login(&mut self, now: OffsetDateTime) {
        self.last_login = rfc3339(now);
    }
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Opaque per-user document store (profile bootstrap only).
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the profile document for `user_id`, if one exists.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, ProviderError>;
    /// Create or replace the profile document for `user_id`.
    async fn store_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), ProviderError>;
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
