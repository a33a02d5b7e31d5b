//! Identity gate and identity extractors.
//!
//! [`gate`] decides what an authenticated-only page does for a given
//! [`IdentityState`]; [`RequireAuth`] applies it to a handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::filters;
use crate::models::AuthSession;
use crate::services::{IdentityState, SessionProvider};
use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// What the gate does with a request.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Identity not yet known: neither redirect nor render the page.
    Pending,
    /// Definitely anonymous.
    RedirectToLogin,
    /// Render the page for this session.
    Allow(AuthSession),
}

/// Decide access to an authenticated-only page.
#[must_use]
pub fn gate(identity: IdentityState) -> GateDecision {
    match identity {
        IdentityState::Unknown => GateDecision::Pending,
        IdentityState::Anonymous => GateDecision::RedirectToLogin,
        IdentityState::SignedIn(session) => GateDecision::Allow(session),
    }
}

/// Neutral page shown while the identity cannot be determined.
#[derive(Template, WebTemplate)]
#[template(path = "gate_pending.html")]
pub struct GatePendingTemplate {
    pub identity: IdentityState,
}

/// Extractor that requires a signed-in identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(session): RequireAuth) -> impl IntoResponse {
///     format!("Olá, {}!", session.identity.email)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Rejection produced by [`RequireAuth`] for the non-`Allow` decisions.
#[derive(Debug)]
pub enum AuthRejection {
    Pending,
    RedirectToLogin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Pending => {
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    GatePendingTemplate {
                        identity: IdentityState::Unknown,
                    },
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static("5"));
                response
            }
        }
    }
}

/// Probe the request's session. Without a session layer nothing is known.
async fn probe(parts: &Parts, state: &AppState) -> IdentityState {
    match parts.extensions.get::<Session>() {
        Some(session) => SessionProvider::new(state.auth(), session).init().await,
        None => IdentityState::Unknown,
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match gate(probe(parts, state).await) {
            GateDecision::Allow(session) => Ok(Self(session)),
            GateDecision::RedirectToLogin => Err(AuthRejection::RedirectToLogin),
            GateDecision::Pending => Err(AuthRejection::Pending),
        }
    }
}

/// Extractor for pages open to everyone that still show identity in the
/// header.
pub struct OptionalAuth(pub IdentityState);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(probe(parts, state).await))
    }
}
