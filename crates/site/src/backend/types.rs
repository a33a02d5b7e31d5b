//! Wire types for the hosted auth (GoTrue) and data (PostgREST) APIs.
//!
//! Only the fields this site reads are declared; everything else in the
//! provider's responses is ignored.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use gastro_serra_core::{RestaurantFields, UserId};

/// Body of `POST /auth/v1/token` and `POST /auth/v1/signup`.
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A user object from `GET /auth/v1/user` or embedded in a token response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Successful password grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp (newer providers only).
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserResponse,
}

impl TokenResponse {
    /// Absolute expiry, preferring the provider's own timestamp.
    #[must_use]
    pub fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in))
    }
}

/// Sign-up answers with a session when email confirmation is disabled and
/// with a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

impl SignUpResponse {
    #[must_use]
    pub fn into_user(self) -> UserResponse {
        match self {
            Self::Session(token) => token.user,
            Self::User(user) => user,
        }
    }
}

/// Error body from the auth API.
///
/// Older deployments use `error`/`error_description`, newer ones `msg` or
/// `message`; whichever is present is shown.
#[derive(Debug, Default, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AuthErrorBody {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Error body from the data API.
#[derive(Debug, Deserialize)]
pub struct StoreErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Insert payload: the editable fields plus the owner.
#[derive(Debug, Serialize)]
pub struct NewRestaurantRow<'a> {
    #[serde(flatten)]
    pub fields: &'a RestaurantFields,
    pub created_by: UserId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_prefers_absolute_timestamp() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "refresh_token": "r",
            "user": { "id": "4f9d8c52-3b1e-4c55-9d0a-1f2e3d4c5b6a", "email": "a@b.c" }
        }))
        .unwrap();
        assert_eq!(token.expiry(Utc::now()).timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_token_expiry_falls_back_to_lifetime() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "expires_in": 60,
            "user": { "id": "4f9d8c52-3b1e-4c55-9d0a-1f2e3d4c5b6a" }
        }))
        .unwrap();
        let now = Utc::now();
        assert_eq!(token.expiry(now), now + Duration::seconds(60));
    }

    #[test]
    fn test_sign_up_accepts_bare_user() {
        let response: SignUpResponse = serde_json::from_value(serde_json::json!({
            "id": "4f9d8c52-3b1e-4c55-9d0a-1f2e3d4c5b6a",
            "email": "novo@serra.com.br",
            "confirmation_sent_at": "2025-03-14T18:30:00Z"
        }))
        .unwrap();
        assert_eq!(response.into_user().email.as_deref(), Some("novo@serra.com.br"));
    }

    #[test]
    fn test_auth_error_body_variants() {
        let old: AuthErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(old.into_message().as_deref(), Some("Invalid login credentials"));

        let new: AuthErrorBody = serde_json::from_str(
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(new.into_message().as_deref(), Some("Invalid login credentials"));

        assert_eq!(AuthErrorBody::default().into_message(), None);
    }

    #[test]
    fn test_new_row_is_flat() {
        let fields = RestaurantFields::named("Trattoria X");
        let owner = UserId::random();
        let value = serde_json::to_value(NewRestaurantRow {
            fields: &fields,
            created_by: owner,
        })
        .unwrap();
        assert_eq!(value["name"], "Trattoria X");
        assert!(value["category"].is_null());
        assert_eq!(value["created_by"], owner.to_string());
    }
}
