//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::{IdentityState, Listing, PLACEHOLDER_IMAGE};
use crate::state::AppState;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub identity: IdentityState,
    pub listing: Listing,
    pub placeholder: &'static str,
}

/// Display the landing page with every restaurant, newest first.
#[instrument(skip(state, identity))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
) -> impl IntoResponse {
    HomeTemplate {
        identity,
        listing: Listing::load(state.store()).await,
        placeholder: PLACEHOLDER_IMAGE,
    }
}
