//! GoTrue (Supabase Auth) client.
//!
//! Uses `reqwest` for HTTP. Positive token lookups are cached using `moka`
//! (5-minute TTL) so that probing the session on every request does not
//! cost a round-trip each time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use gastro_serra_core::Email;

use super::types::{AuthErrorBody, Credentials, SignUpResponse, TokenResponse, UserResponse};
use super::{AuthError, AuthProvider};
use crate::config::SupabaseConfig;
use crate::models::{AuthSession, Identity};

/// Client for the hosted authentication API.
#[derive(Clone)]
pub struct SupabaseAuth {
    inner: Arc<SupabaseAuthInner>,
}

struct SupabaseAuthInner {
    client: reqwest::Client,
    config: SupabaseConfig,
    /// Access token -> identity, for tokens the provider recently accepted.
    identities: Cache<String, Identity>,
}

impl SupabaseAuth {
    /// Create a new auth client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &SupabaseConfig) -> Self {
        let identities = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(SupabaseAuthInner {
                client,
                config: config.clone(),
                identities,
            }),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, self.inner.config.endpoint(path))
            .header("apikey", self.inner.config.anon_key.expose_secret())
    }

    /// Send a request and decode a successful body, turning error bodies into
    /// `AuthError::Rejected` with the provider's message.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AuthError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<AuthErrorBody>(&body)
                .ok()
                .and_then(AuthErrorBody::into_message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            debug!(status = %status, message = %message, "auth provider rejected request");
            return Err(AuthError::Rejected(message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Convert a provider user into an identity, requiring an email.
fn identity_from(user: UserResponse, fallback: &Email) -> Identity {
    let email = user
        .email
        .as_deref()
        .and_then(|e| Email::parse(e).ok())
        .unwrap_or_else(|| fallback.clone());

    Identity { id: user.id, email }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let token: TokenResponse = self
            .execute(
                self.request(reqwest::Method::POST, "auth/v1/token?grant_type=password")
                    .json(&Credentials {
                        email: email.as_str(),
                        password: password.expose_secret(),
                    }),
            )
            .await?;

        let expires_at = token.expiry(Utc::now());
        let identity = identity_from(token.user, email);
        self.inner
            .identities
            .insert(token.access_token.clone(), identity.clone())
            .await;

        Ok(AuthSession::new(
            identity,
            SecretString::from(token.access_token),
            expires_at,
        ))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<Identity, AuthError> {
        let response: SignUpResponse = self
            .execute(
                self.request(reqwest::Method::POST, "auth/v1/signup")
                    .json(&Credentials {
                        email: email.as_str(),
                        password: password.expose_secret(),
                    }),
            )
            .await?;

        Ok(identity_from(response.into_user(), email))
    }

    #[instrument(skip(self, session), fields(user_id = %session.identity.id))]
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let token = session.access_token().expose_secret();
        self.inner.identities.invalidate(token).await;

        let response = self
            .request(reqwest::Method::POST, "auth/v1/logout")
            .bearer_auth(token)
            .send()
            .await?;

        // An already-invalid token is as good as a revoked one.
        match response.status() {
            s if s.is_success() || s == StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(AuthError::Rejected(format!("HTTP {status}"))),
        }
    }

    async fn get_session(
        &self,
        access_token: &SecretString,
    ) -> Result<Option<Identity>, AuthError> {
        let token = access_token.expose_secret();
        if let Some(identity) = self.inner.identities.get(token).await {
            return Ok(Some(identity));
        }

        let response = self
            .request(reqwest::Method::GET, "auth/v1/user")
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!("auth provider no longer accepts the session token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::Rejected(format!("HTTP {status}")));
        }

        let user: UserResponse = response.json().await?;
        let Some(email) = user.email.as_deref().and_then(|e| Email::parse(e).ok()) else {
            return Ok(None);
        };
        let identity = Identity { id: user.id, email };

        self.inner
            .identities
            .insert(token.to_string(), identity.clone())
            .await;

        Ok(Some(identity))
    }
}
