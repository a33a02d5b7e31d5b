//! Record management view: the owner's admin screen as a state machine.
//!
//! ```text
//!            open_new                     submit ok / cancel
//!  Viewing ───────────► Form(Draft::New) ─────────────────────► Viewing
//!     │     open_edit                     submit ok / cancel
//!     └───────────────► Form(Draft::Editing{id}) ─────────────► Viewing
//!  Viewing ── delete(Confirmed) ──► Viewing (+ banner, re-fetched)
//! ```
//!
//! A failed submit stays in the form with the store's message in the banner.
//! Every successful write is followed by a full re-fetch of the owner's
//! records, awaited only after the write itself resolved.
//!
//! Between requests the mode and banner live in the browser session under
//! [`session_keys::MANAGEMENT_VIEW`]; the record list is never persisted.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, error, warn};

use gastro_serra_core::{Draft, Restaurant, RestaurantFields, RestaurantId, UserId};

use crate::backend::{ListScope, RestaurantStore};
use crate::models::{AuthSession, session_keys};

pub const CREATED: &str = "Restaurante cadastrado com sucesso!";
pub const UPDATED: &str = "Restaurante atualizado com sucesso!";
pub const DELETED: &str = "Restaurante excluído com sucesso!";
pub const SAVE_FAILED: &str = "Erro ao salvar restaurante";
pub const DELETE_FAILED: &str = "Erro ao excluir restaurante";
pub const LOAD_FAILED: &str = "Erro ao carregar restaurantes";
pub const NAME_REQUIRED: &str = "O nome do restaurante é obrigatório.";
pub const NOT_LISTED: &str = "Restaurante não encontrado.";

/// Whether the form is open, and for which draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    /// List only.
    #[default]
    Viewing,
    /// Form open. `Draft::New` is creating, `Draft::Editing` is editing.
    Form { draft: Draft },
}

/// The single message slot above the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Banner {
    Error(String),
    Success(String),
}

impl Banner {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Error(message) | Self::Success(message) => message,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Answer to "Tem certeza que deseja excluir este restaurante?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Confirmation {
    #[serde(rename = "yes")]
    Confirmed,
    #[serde(rename = "no")]
    Declined,
}

/// The admin screen of one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementView {
    owner: UserId,
    mode: Mode,
    banner: Option<Banner>,
    #[serde(skip)]
    restaurants: Vec<Restaurant>,
    /// True until the first list read finishes, successfully or not.
    #[serde(skip, default = "loading_default")]
    loading: bool,
}

const fn loading_default() -> bool {
    true
}

impl ManagementView {
    /// A fresh view in `Viewing` with nothing loaded yet.
    #[must_use]
    pub const fn new(owner: UserId) -> Self {
        Self {
            owner,
            mode: Mode::Viewing,
            banner: None,
            restaurants: Vec::new(),
            loading: true,
        }
    }

    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    #[must_use]
    pub const fn mode(&self) -> &Mode {
        &self.mode
    }

    #[must_use]
    pub const fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// The owner's records as of the last re-fetch, newest first.
    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The open draft, if the form is shown.
    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        match &self.mode {
            Mode::Viewing => None,
            Mode::Form { draft } => Some(draft),
        }
    }

    /// Remove and return the banner, so it is shown once.
    pub fn take_banner(&mut self) -> Option<Banner> {
        self.banner.take()
    }

    /// `Viewing -> Creating`, discarding any previous draft and banner.
    pub fn open_new(&mut self) {
        self.mode = Mode::Form {
            draft: Draft::default(),
        };
        self.banner = None;
    }

    /// A listed record by id, for an action about to be taken on it.
    ///
    /// A record that is not listed (someone else's, or already gone) sets
    /// an error banner.
    pub fn select(&mut self, id: RestaurantId) -> Option<&Restaurant> {
        let Some(index) = self.restaurants.iter().position(|r| r.id == id) else {
            self.banner = Some(Banner::Error(NOT_LISTED.to_string()));
            return None;
        };
        self.restaurants.get(index)
    }

    /// `Viewing -> Editing` for a record in the current list.
    ///
    /// An unlisted record leaves the mode unchanged.
    pub fn open_edit(&mut self, id: RestaurantId) {
        let Some(record) = self.select(id) else {
            return;
        };
        let draft = Draft::editing(record);
        self.mode = Mode::Form { draft };
        self.banner = None;
    }

    /// Close the form without saving.
    pub fn cancel(&mut self) {
        self.mode = Mode::Viewing;
    }

    /// Replace the list with the owner's records, newest first.
    pub async fn refresh(&mut self, store: &dyn RestaurantStore, actor: &AuthSession) {
        match store.list(ListScope::OwnedBy(actor)).await {
            Ok(rows) => self.restaurants = rows,
            Err(e) => {
                error!(error = %e, user_id = %actor.identity.id, "Error loading restaurants");
                self.banner = Some(Banner::Error(LOAD_FAILED.to_string()));
            }
        }
        self.loading = false;
    }

    /// Submit `fields` for the open draft.
    ///
    /// Does nothing when no form is open. A blank name never reaches the
    /// store. A store rejection keeps the form open with the submitted
    /// fields and is not retried.
    pub async fn submit(
        &mut self,
        store: &dyn RestaurantStore,
        actor: &AuthSession,
        fields: RestaurantFields,
    ) {
        self.banner = None;

        let Mode::Form { draft } = &mut self.mode else {
            debug!("Submit without an open form ignored");
            return;
        };
        draft.set_fields(fields);

        if !draft.fields().has_name() {
            self.banner = Some(Banner::Error(NAME_REQUIRED.to_string()));
            return;
        }

        let result = match draft.target() {
            None => store.insert(actor, draft.fields()).await.map(|_| CREATED),
            Some(id) => store.update(actor, id, draft.fields()).await.map(|_| UPDATED),
        };

        match result {
            Ok(message) => {
                self.mode = Mode::Viewing;
                self.banner = Some(Banner::Success(message.to_string()));
                self.refresh(store, actor).await;
            }
            Err(e) => {
                warn!(error = %e, user_id = %actor.identity.id, "Failed to save restaurant");
                self.banner = Some(Banner::Error(
                    e.user_message().unwrap_or_else(|| SAVE_FAILED.to_string()),
                ));
            }
        }
    }

    /// Delete `id` once the owner confirmed. Declining changes nothing.
    pub async fn delete(
        &mut self,
        store: &dyn RestaurantStore,
        actor: &AuthSession,
        id: RestaurantId,
        confirmation: Confirmation,
    ) {
        if confirmation == Confirmation::Declined {
            return;
        }
        self.banner = None;

        match store.delete(actor, id).await {
            Ok(()) => {
                self.banner = Some(Banner::Success(DELETED.to_string()));
                self.refresh(store, actor).await;
            }
            Err(e) => {
                warn!(error = %e, user_id = %actor.identity.id, "Failed to delete restaurant");
                self.banner = Some(Banner::Error(
                    e.user_message().unwrap_or_else(|| DELETE_FAILED.to_string()),
                ));
            }
        }
    }

    /// Restore `actor`'s view from the session. A view stored for another
    /// identity, or one that cannot be read, is replaced by a fresh one.
    pub async fn load(session: &Session, actor: &AuthSession) -> Self {
        let owner = actor.identity.id;
        match session
            .get::<Self>(session_keys::MANAGEMENT_VIEW)
            .await
        {
            Ok(Some(view)) if view.owner == owner => view,
            Ok(_) => Self::new(owner),
            Err(e) => {
                warn!(error = %e, "Failed to read management view");
                Self::new(owner)
            }
        }
    }

    /// Persist the view, unless the session has meanwhile been signed out
    /// or handed to another identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        let current = session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await?;

        if current.is_none_or(|s| s.identity.id != self.owner) {
            debug!(owner = %self.owner, "Session changed identity, view discarded");
            return Ok(());
        }

        session.insert(session_keys::MANAGEMENT_VIEW, self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use gastro_serra_core::Email;

    use super::*;
    use crate::backend::{AuthProvider, MemoryBackend};

    async fn signed_in(backend: &MemoryBackend, email: &str) -> AuthSession {
        let email = Email::parse(email).unwrap();
        let password = SecretString::from("segredo1");
        backend.sign_up(&email, &password).await.unwrap();
        backend.sign_in(&email, &password).await.unwrap()
    }

    async fn setup() -> (MemoryBackend, AuthSession, ManagementView) {
        let backend = MemoryBackend::new();
        let actor = signed_in(&backend, "dono@serra.com.br").await;
        let mut view = ManagementView::new(actor.identity.id);
        view.refresh(&backend, &actor).await;
        (backend, actor, view)
    }

    async fn create(view: &mut ManagementView, backend: &MemoryBackend, actor: &AuthSession, name: &str) {
        view.open_new();
        view.submit(backend, actor, RestaurantFields::named(name))
            .await;
    }

    #[tokio::test]
    async fn test_starts_viewing_and_loading() {
        let view = ManagementView::new(UserId::random());
        assert_eq!(view.mode(), &Mode::Viewing);
        assert!(view.is_loading());
        assert!(view.banner().is_none());
    }

    #[tokio::test]
    async fn test_create_inserts_one_owned_record() {
        let (backend, actor, mut view) = setup().await;
        assert!(!view.is_loading());

        create(&mut view, &backend, &actor, "Trattoria X").await;

        assert_eq!(view.mode(), &Mode::Viewing);
        assert_eq!(view.banner(), Some(&Banner::Success(CREATED.to_string())));
        assert_eq!(view.restaurants().len(), 1);

        let record = &view.restaurants()[0];
        assert_eq!(record.name, "Trattoria X");
        assert_eq!(record.created_by, actor.identity.id);
        assert_eq!(record.description, None);
        assert_eq!(record.image_url, None);
    }

    #[tokio::test]
    async fn test_newest_record_listed_first() {
        let (backend, actor, mut view) = setup().await;
        create(&mut view, &backend, &actor, "Primeiro").await;
        create(&mut view, &backend, &actor, "Segundo").await;

        let names: Vec<&str> = view.restaurants().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Segundo", "Primeiro"]);
    }

    #[tokio::test]
    async fn test_blank_name_never_reaches_store() {
        let (backend, actor, mut view) = setup().await;
        let calls = backend.store_calls();

        view.open_new();
        let mut fields = RestaurantFields::named("   ");
        fields.category = Some("Fondue".to_string());
        view.submit(&backend, &actor, fields).await;

        assert_eq!(backend.store_calls(), calls);
        assert_eq!(view.banner(), Some(&Banner::Error(NAME_REQUIRED.to_string())));
        assert_eq!(
            view.draft().unwrap().fields().category.as_deref(),
            Some("Fondue")
        );
    }

    #[tokio::test]
    async fn test_edit_changes_only_submitted_field() {
        let (backend, actor, mut view) = setup().await;
        view.open_new();
        let mut fields = RestaurantFields::named("Cantina");
        fields.phone = Some("54 3286-0000".to_string());
        fields.description = Some("Massas caseiras".to_string());
        view.submit(&backend, &actor, fields).await;
        let before = view.restaurants()[0].clone();

        view.open_edit(before.id);
        let mut edited = view.draft().unwrap().fields().clone();
        edited.category = Some("Italiana".to_string());
        view.submit(&backend, &actor, edited).await;

        assert_eq!(view.banner(), Some(&Banner::Success(UPDATED.to_string())));
        let after = &view.restaurants()[0];
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_by, before.created_by);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.category.as_deref(), Some("Italiana"));
        assert_eq!(after.name, before.name);
        assert_eq!(after.phone, before.phone);
        assert_eq!(after.description, before.description);
    }

    /// What a browser posts for `fields`: every input present, empty ones as "".
    fn as_submitted(fields: &RestaurantFields) -> RestaurantFields {
        let input = |value: &Option<String>| Some(value.clone().unwrap_or_default());
        RestaurantFields {
            name: fields.name.clone(),
            description: input(&fields.description),
            address: input(&fields.address),
            phone: input(&fields.phone),
            email: input(&fields.email),
            category: input(&fields.category),
            image_url: input(&fields.image_url),
        }
    }

    #[tokio::test]
    async fn test_edit_category_keeps_null_columns_null() {
        let (backend, actor, mut view) = setup().await;
        let before = backend
            .insert(&actor, &RestaurantFields::named("Cantina"))
            .await
            .unwrap();
        assert_eq!(before.description, None);
        view.refresh(&backend, &actor).await;

        view.open_edit(before.id);
        let mut submitted = as_submitted(view.draft().unwrap().fields());
        submitted.category = Some("Italiana".to_string());
        view.submit(&backend, &actor, submitted).await;

        assert_eq!(view.banner(), Some(&Banner::Success(UPDATED.to_string())));
        let after = &view.restaurants()[0];
        assert_eq!(after.category.as_deref(), Some("Italiana"));
        assert_eq!(after.description, None);
        assert_eq!(after.address, None);
        assert_eq!(after.phone, None);
        assert_eq!(after.email, None);
        assert_eq!(after.image_url, None);
    }

    #[tokio::test]
    async fn test_rejected_save_stays_in_form() {
        let (backend, actor, mut view) = setup().await;
        backend.fail_next_write("duplicate key value violates unique constraint");

        create(&mut view, &backend, &actor, "Cantina").await;

        assert_eq!(
            view.banner(),
            Some(&Banner::Error(
                "duplicate key value violates unique constraint".to_string()
            ))
        );
        assert_eq!(view.draft().unwrap().fields().name, "Cantina");
        assert!(backend.rows().is_empty());
    }

    #[tokio::test]
    async fn test_blank_rejection_uses_fallback() {
        let (backend, actor, mut view) = setup().await;
        backend.fail_next_write("");
        create(&mut view, &backend, &actor, "Cantina").await;
        assert_eq!(view.banner(), Some(&Banner::Error(SAVE_FAILED.to_string())));
    }

    #[tokio::test]
    async fn test_open_new_clears_draft_and_banner() {
        let (backend, actor, mut view) = setup().await;
        create(&mut view, &backend, &actor, "Cantina").await;
        let id = view.restaurants()[0].id;

        view.open_edit(id);
        view.open_new();

        assert_eq!(view.draft(), Some(&Draft::default()));
        assert!(view.banner().is_none());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_viewing() {
        let (_backend, _actor, mut view) = setup().await;
        view.open_new();
        view.cancel();
        assert_eq!(view.mode(), &Mode::Viewing);
    }

    #[tokio::test]
    async fn test_open_edit_of_unlisted_record() {
        let (_backend, _actor, mut view) = setup().await;
        view.open_edit(RestaurantId::random());
        assert_eq!(view.mode(), &Mode::Viewing);
        assert_eq!(view.banner(), Some(&Banner::Error(NOT_LISTED.to_string())));
    }

    #[tokio::test]
    async fn test_submit_without_form_is_ignored() {
        let (backend, actor, mut view) = setup().await;
        let calls = backend.store_calls();
        view.submit(&backend, &actor, RestaurantFields::named("Cantina"))
            .await;
        assert_eq!(backend.store_calls(), calls);
        assert_eq!(view.mode(), &Mode::Viewing);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (backend, actor, mut view) = setup().await;
        create(&mut view, &backend, &actor, "Cantina").await;
        let id = view.restaurants()[0].id;

        view.delete(&backend, &actor, id, Confirmation::Declined)
            .await;
        assert_eq!(view.restaurants().len(), 1);

        view.delete(&backend, &actor, id, Confirmation::Confirmed)
            .await;
        assert!(view.restaurants().is_empty());
        assert_eq!(view.banner(), Some(&Banner::Success(DELETED.to_string())));
    }

    #[tokio::test]
    async fn test_delete_leaves_other_owners_alone() {
        let (backend, alice, mut alice_view) = setup().await;
        let bob = signed_in(&backend, "bob@serra.com.br").await;
        let mut bob_view = ManagementView::new(bob.identity.id);

        create(&mut alice_view, &backend, &alice, "Da Alice").await;
        create(&mut bob_view, &backend, &bob, "Do Bob").await;
        let alice_id = alice_view.restaurants()[0].id;

        bob_view
            .delete(&backend, &bob, alice_id, Confirmation::Confirmed)
            .await;
        assert_eq!(
            bob_view.banner(),
            Some(&Banner::Error("Restaurante não encontrado.".to_string()))
        );

        alice_view.refresh(&backend, &alice).await;
        assert_eq!(alice_view.restaurants().len(), 1);
        assert_eq!(bob_view.restaurants().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_sets_load_banner() {
        let (backend, actor, mut view) = setup().await;
        backend.fail_reads(true);
        view.refresh(&backend, &actor).await;
        assert_eq!(view.banner(), Some(&Banner::Error(LOAD_FAILED.to_string())));
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_session_round_trip_is_owner_bound() {
        let (backend, actor, mut view) = setup().await;
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(session_keys::AUTH_SESSION, &actor)
            .await
            .unwrap();

        view.open_new();
        view.save(&session).await.unwrap();
        let restored = ManagementView::load(&session, &actor).await;
        assert_eq!(restored.draft(), Some(&Draft::default()));

        let other = signed_in(&backend, "outro@serra.com.br").await;
        let fresh = ManagementView::load(&session, &other).await;
        assert_eq!(fresh.mode(), &Mode::Viewing);
        assert_eq!(fresh.owner(), other.identity.id);
    }

    #[tokio::test]
    async fn test_save_after_sign_out_is_discarded() {
        let (_backend, actor, mut view) = setup().await;
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        view.open_new();
        view.save(&session).await.unwrap();

        let stored: Option<serde_json::Value> =
            session.get(session_keys::MANAGEMENT_VIEW).await.unwrap();
        assert!(stored.is_none());
        let restored = ManagementView::load(&session, &actor).await;
        assert_eq!(restored.mode(), &Mode::Viewing);
    }
}
