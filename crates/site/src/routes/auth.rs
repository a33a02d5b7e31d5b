//! Login, sign-up and logout route handlers.
//!
//! One page serves both forms, switched by `?mode=signup`. Outcomes are
//! carried to the next page view as a one-shot flash in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::services::{Banner, IdentityState, SessionProvider};
use crate::state::AppState;

/// Shown after a successful sign-up; the new account still has to log in.
pub const SIGNED_UP: &str = "Conta criada com sucesso! Faça login para continuar.";

/// Which of the two forms the page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl AuthMode {
    const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/login?mode=signup",
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub mode: AuthMode,
}

/// Login / sign-up form data.
#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub identity: IdentityState,
    pub mode: AuthMode,
    pub banner: Option<Banner>,
    pub min_password_length: usize,
}

impl LoginTemplate {
    #[must_use]
    pub fn is_signup(&self) -> bool {
        self.mode == AuthMode::Signup
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login or sign-up form.
pub async fn login_page(
    session: Session,
    OptionalAuth(identity): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Result<impl IntoResponse, AppError> {
    let banner = session.remove::<Banner>(session_keys::LOGIN_FLASH).await?;

    Ok(LoginTemplate {
        identity,
        mode: query.mode,
        banner,
        min_password_length: crate::services::session::MIN_PASSWORD_LENGTH,
    })
}

/// Handle login or sign-up form submission.
///
/// A successful login goes to the admin screen. A successful sign-up goes
/// back to the login form. Failures return to the submitted form with the
/// provider's message.
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let provider = SessionProvider::new(state.auth(), &session);
    let password = SecretString::from(form.password);

    let result = match form.mode {
        AuthMode::Login => provider.sign_in(&form.email, &password).await.map(|identity| {
            info!(user_id = %identity.id, "User signed in");
            set_sentry_user(&identity.id, Some(identity.email.as_str()));
            ("/admin", None)
        }),
        AuthMode::Signup => provider.sign_up(&form.email, &password).await.map(|identity| {
            info!(user_id = %identity.id, "Account created");
            (
                AuthMode::Login.path(),
                Some(Banner::Success(SIGNED_UP.to_string())),
            )
        }),
    };

    let (to, flash) = result.unwrap_or_else(|e| {
        warn!(error = %e, mode = ?form.mode, "Authentication failed");
        (form.mode.path(), Some(Banner::Error(e.user_message())))
    });

    if let Some(flash) = flash {
        session.insert(session_keys::LOGIN_FLASH, &flash).await?;
    }
    Ok(Redirect::to(to).into_response())
}

/// Sign out and return to the landing page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    SessionProvider::new(state.auth(), &session)
        .sign_out()
        .await?;
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}
