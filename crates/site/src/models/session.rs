//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use gastro_serra_core::{Email, UserId};

/// An authenticated identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user id; becomes `created_by` on inserts.
    pub id: UserId,
    pub email: Email,
}

/// A signed-in identity plus the provider token that proves it.
///
/// Stored in the session under [`keys::AUTH_SESSION`]. The token is only
/// exposed when building a request to the backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    #[serde(serialize_with = "expose_token", deserialize_with = "wrap_token")]
    access_token: SecretString,
    /// When the provider stops accepting the token.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    #[must_use]
    pub fn new(identity: Identity, access_token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            access_token,
            expires_at,
        }
    }

    /// Get the provider access token.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// Whether the token has passed its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("identity", &self.identity)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn expose_token<S: Serializer>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

fn wrap_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in [`AuthSession`](super::AuthSession).
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the persisted admin screen state.
    pub const MANAGEMENT_VIEW: &str = "management_view";

    /// Key for the one-shot message shown on the login page.
    pub const LOGIN_FLASH: &str = "login_flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession::new(
            Identity {
                id: UserId::random(),
                email: Email::parse("dono@serra.com.br").unwrap(),
            },
            SecretString::from("jwt-token-value"),
            expires_at,
        )
    }

    #[test]
    fn test_debug_redacts_token() {
        let output = format!("{:?}", session(Utc::now()));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("jwt-token-value"));
    }

    #[test]
    fn test_token_survives_session_storage() {
        let json = serde_json::to_string(&session(Utc::now())).unwrap();
        let back: AuthSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access_token().expose_secret(), "jwt-token-value");
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(session(now - Duration::seconds(1)).is_expired_at(now));
        assert!(!session(now + Duration::hours(1)).is_expired_at(now));
    }
}
