//! Session provider.
//!
//! Binds the browser session to the auth provider. Each request builds a
//! [`SessionProvider`] from the shared provider in [`AppState`] and the
//! request's [`Session`]; nothing is held between requests except what the
//! session store keeps.
//!
//! [`AppState`]: crate::state::AppState

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;
use tracing::{debug, warn};

use gastro_serra_core::Email;

use crate::backend::{AuthError, AuthProvider};
use crate::models::{AuthSession, Identity, session_keys};

/// Minimum password length accepted on sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// What is known about the browser's identity after [`SessionProvider::init`].
#[derive(Debug, Clone)]
pub enum IdentityState {
    /// The probe could not complete (provider or session store unreachable).
    Unknown,
    /// No valid session.
    Anonymous,
    /// A session the provider still accepts.
    SignedIn(AuthSession),
}

impl IdentityState {
    /// The signed-in session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::SignedIn(session) => Some(session),
            Self::Unknown | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Per-request view over the stored session and the auth provider.
pub struct SessionProvider<'a> {
    auth: &'a dyn AuthProvider,
    session: &'a Session,
}

impl<'a> SessionProvider<'a> {
    #[must_use]
    pub const fn new(auth: &'a dyn AuthProvider, session: &'a Session) -> Self {
        Self { auth, session }
    }

    /// Probe the stored session.
    ///
    /// Expired tokens and tokens the provider rejects are cleared from the
    /// session. Failures to reach the provider leave the session untouched
    /// and report [`IdentityState::Unknown`].
    pub async fn init(&self) -> IdentityState {
        let stored = match self
            .session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await
        {
            Ok(Some(stored)) => stored,
            Ok(None) => return IdentityState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                return IdentityState::Unknown;
            }
        };

        if stored.is_expired_at(Utc::now()) {
            debug!(user_id = %stored.identity.id, "Stored session expired");
            return self.forget().await;
        }

        match self.auth.get_session(stored.access_token()).await {
            Ok(Some(identity)) if identity.id == stored.identity.id => {
                IdentityState::SignedIn(stored)
            }
            Ok(_) => {
                debug!(user_id = %stored.identity.id, "Provider no longer accepts session");
                self.forget().await
            }
            Err(e) => {
                warn!(error = %e, "Failed to validate session with provider");
                IdentityState::Unknown
            }
        }
    }

    /// Sign in with email and password and store the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, the
    /// provider's rejection, or a session store error.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        let auth_session = self.auth.sign_in(&email, password).await?;

        self.session.cycle_id().await?;
        self.session
            .remove::<serde_json::Value>(session_keys::MANAGEMENT_VIEW)
            .await?;
        self.session
            .insert(session_keys::AUTH_SESSION, &auth_session)
            .await?;

        Ok(auth_session.identity)
    }

    /// Create an account. The new identity is not signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` before
    /// contacting the provider, or the provider's rejection.
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        self.auth.sign_up(&email, password).await
    }

    /// Revoke the token at the provider (best effort) and drop the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session cannot be flushed.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let stored = self
            .session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await
            .ok()
            .flatten();

        if let Some(stored) = stored
            && let Err(e) = self.auth.sign_out(&stored).await
        {
            warn!(error = %e, user_id = %stored.identity.id, "Provider logout failed");
        }

        self.session.flush().await?;
        Ok(())
    }

    /// Remove a session the provider no longer honours.
    async fn forget(&self) -> IdentityState {
        let cleared = async {
            self.session
                .remove::<serde_json::Value>(session_keys::AUTH_SESSION)
                .await?;
            self.session
                .remove::<serde_json::Value>(session_keys::MANAGEMENT_VIEW)
                .await
        };

        match cleared.await {
            Ok(_) => IdentityState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Failed to clear stale session");
                IdentityState::Unknown
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::backend::MemoryBackend;

    const EMAIL: &str = "dono@serra.com.br";
    const PASSWORD: &str = "segredo1";

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn registered() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .sign_up(
                &Email::parse(EMAIL).unwrap(),
                &SecretString::from(PASSWORD),
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_init_without_session_is_anonymous() {
        let backend = MemoryBackend::new();
        let session = session();
        let state = SessionProvider::new(&backend, &session).init().await;
        assert!(matches!(state, IdentityState::Anonymous));
    }

    #[tokio::test]
    async fn test_sign_in_then_init_is_signed_in() {
        let backend = registered().await;
        let session = session();
        let provider = SessionProvider::new(&backend, &session);

        let identity = provider
            .sign_in("  Dono@Serra.com.br ", &SecretString::from(PASSWORD))
            .await
            .unwrap();
        assert_eq!(identity.email.as_str(), EMAIL);

        let state = provider.init().await;
        assert_eq!(state.session().unwrap().identity, identity);
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_provider_message() {
        let backend = registered().await;
        let session = session();
        let err = SessionProvider::new(&backend, &session)
            .sign_in(EMAIL, &SecretString::from("errada"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_revoked_token_is_cleared() {
        let backend = registered().await;
        let session = session();
        let provider = SessionProvider::new(&backend, &session);
        provider
            .sign_in(EMAIL, &SecretString::from(PASSWORD))
            .await
            .unwrap();

        backend.revoke_all_tokens();

        assert!(matches!(provider.init().await, IdentityState::Anonymous));
        let stored: Option<AuthSession> = session.get(session_keys::AUTH_SESSION).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_cleared_without_asking_provider() {
        let backend = registered().await;
        let session = session();
        let provider = SessionProvider::new(&backend, &session);
        provider
            .sign_in(EMAIL, &SecretString::from(PASSWORD))
            .await
            .unwrap();

        let mut stored: AuthSession = session
            .get(session_keys::AUTH_SESSION)
            .await
            .unwrap()
            .unwrap();
        stored.expires_at = Utc::now() - Duration::seconds(1);
        session
            .insert(session_keys::AUTH_SESSION, &stored)
            .await
            .unwrap();
        backend.set_auth_unavailable(true);

        assert!(matches!(provider.init().await, IdentityState::Anonymous));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unknown_and_keeps_session() {
        let backend = registered().await;
        let session = session();
        let provider = SessionProvider::new(&backend, &session);
        provider
            .sign_in(EMAIL, &SecretString::from(PASSWORD))
            .await
            .unwrap();

        backend.set_auth_unavailable(true);
        assert!(matches!(provider.init().await, IdentityState::Unknown));

        backend.set_auth_unavailable(false);
        assert!(matches!(provider.init().await, IdentityState::SignedIn(_)));
    }

    #[tokio::test]
    async fn test_sign_up_validates_locally() {
        let backend = MemoryBackend::new();
        let session = session();
        let provider = SessionProvider::new(&backend, &session);

        let err = provider
            .sign_up("novo@serra.com.br", &SecretString::from("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword { min: 6 }));

        let err = provider
            .sign_up("sem-arroba", &SecretString::from(PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_sign_up_does_not_sign_in() {
        let backend = MemoryBackend::new();
        let session = session();
        let provider = SessionProvider::new(&backend, &session);

        provider
            .sign_up("novo@serra.com.br", &SecretString::from(PASSWORD))
            .await
            .unwrap();
        assert!(matches!(provider.init().await, IdentityState::Anonymous));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_clears() {
        let backend = registered().await;
        let session = session();
        let provider = SessionProvider::new(&backend, &session);
        provider
            .sign_in(EMAIL, &SecretString::from(PASSWORD))
            .await
            .unwrap();
        let stored: AuthSession = session
            .get(session_keys::AUTH_SESSION)
            .await
            .unwrap()
            .unwrap();

        provider.sign_out().await.unwrap();

        assert!(matches!(provider.init().await, IdentityState::Anonymous));
        let revoked = backend.get_session(stored.access_token()).await.unwrap();
        assert!(revoked.is_none());
    }
}
