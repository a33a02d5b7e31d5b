//! Owner admin route handlers.
//!
//! Every handler restores the owner's [`ManagementView`] from the session,
//! applies one transition, and saves it back. POST handlers redirect to
//! `/admin`, which re-fetches the list and shows the banner once.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use gastro_serra_core::{Restaurant, RestaurantFields, RestaurantId};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::AuthSession;
use crate::services::{Banner, Confirmation, IdentityState, ManagementView};
use crate::state::AppState;

const ADMIN_PATH: &str = "/admin";

// =============================================================================
// Templates
// =============================================================================

/// Admin screen template: banner, optional form, and the owner's list.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub identity: IdentityState,
    pub banner: Option<Banner>,
    pub view: ManagementView,
}

impl AdminTemplate {
    /// Heading and submit label of the open form.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.view.draft().is_some_and(|d| d.target().is_some())
    }
}

/// Delete confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "admin/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub identity: IdentityState,
    pub restaurant: Restaurant,
}

/// Confirmation form data.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub confirm: Confirmation,
}

// =============================================================================
// Helpers
// =============================================================================

/// Render the view, consuming its banner, and persist what remains.
async fn render(
    session: &Session,
    actor: AuthSession,
    mut view: ManagementView,
) -> Result<Response, AppError> {
    let banner = view.take_banner();
    view.save(session).await?;

    Ok(AdminTemplate {
        identity: IdentityState::SignedIn(actor),
        banner,
        view,
    }
    .into_response())
}

async fn save_and_redirect(session: &Session, view: &ManagementView) -> Result<Response, AppError> {
    view.save(session).await?;
    Ok(Redirect::to(ADMIN_PATH).into_response())
}

// =============================================================================
// Routes
// =============================================================================

/// Display the admin screen.
#[instrument(skip_all, fields(user_id = %actor.identity.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(actor): RequireAuth,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.refresh(state.store(), &actor).await;
    render(&session, actor, view).await
}

/// Open an empty create form.
pub async fn open_new(
    session: Session,
    RequireAuth(actor): RequireAuth,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.open_new();
    save_and_redirect(&session, &view).await
}

/// Open the edit form for one of the owner's records.
#[instrument(skip_all, fields(user_id = %actor.identity.id))]
pub async fn open_edit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<RestaurantId>,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.refresh(state.store(), &actor).await;
    view.open_edit(id);
    render(&session, actor, view).await
}

/// Close the form without saving.
pub async fn cancel(
    session: Session,
    RequireAuth(actor): RequireAuth,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.cancel();
    save_and_redirect(&session, &view).await
}

/// Submit the open form.
#[instrument(skip_all, fields(user_id = %actor.identity.id))]
pub async fn save(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(actor): RequireAuth,
    Form(fields): Form<RestaurantFields>,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.submit(state.store(), &actor, fields).await;

    if let Some(Banner::Success(message)) = view.banner() {
        add_breadcrumb("admin", message, None);
    }
    save_and_redirect(&session, &view).await
}

/// Ask "Tem certeza que deseja excluir este restaurante?".
#[instrument(skip_all, fields(user_id = %actor.identity.id))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<RestaurantId>,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.refresh(state.store(), &actor).await;

    let Some(restaurant) = view.select(id).cloned() else {
        return save_and_redirect(&session, &view).await;
    };

    Ok(ConfirmDeleteTemplate {
        identity: IdentityState::SignedIn(actor),
        restaurant,
    }
    .into_response())
}

/// Apply the owner's answer to the delete confirmation.
#[instrument(skip_all, fields(user_id = %actor.identity.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<RestaurantId>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let mut view = ManagementView::load(&session, &actor).await;
    view.delete(state.store(), &actor, id, form.confirm).await;

    if form.confirm == Confirmation::Confirmed {
        let id = id.to_string();
        add_breadcrumb("admin", "Restaurant delete", Some(&[("restaurant_id", id.as_str())]));
    }
    save_and_redirect(&session, &view).await
}
