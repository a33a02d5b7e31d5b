//! In-process backend implementing both [`AuthProvider`] and [`RestaurantStore`].
//!
//! Behaves like the hosted services in the ways the site depends on: tokens
//! are opaque, rows get their id and `created_at` from the store, listings
//! come back newest first, and writes only touch rows owned by the caller.
//! Failure switches let tests drive the rejection paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use gastro_serra_core::{Email, Restaurant, RestaurantFields, RestaurantId, UserId};

use super::{AuthError, AuthProvider, ListScope, RestaurantStore, StoreError};
use crate::models::{AuthSession, Identity};

/// Token lifetime handed out by [`MemoryBackend::sign_in`].
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Shared in-memory auth + table backend. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    state: Mutex<MemoryState>,
    store_calls: AtomicUsize,
    auth_unavailable: AtomicBool,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Email, (UserId, String)>,
    tokens: HashMap<String, Identity>,
    rows: Vec<Restaurant>,
    last_created_at: Option<DateTime<Utc>>,
    fail_next_write: Option<String>,
    fail_reads: bool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of calls that reached the table, reads and writes alike.
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.inner.store_calls.load(Ordering::SeqCst)
    }

    /// Every stored row, in insertion order, regardless of owner.
    #[must_use]
    pub fn rows(&self) -> Vec<Restaurant> {
        self.state().rows.clone()
    }

    /// Make the next insert, update or delete fail with `message`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.state().fail_next_write = Some(message.into());
    }

    /// Make listing reads fail until switched back.
    pub fn fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// Make token lookups fail as if the provider were unreachable.
    pub fn set_auth_unavailable(&self, unavailable: bool) {
        self.inner
            .auth_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    /// Forget every issued token, as if they had all expired.
    pub fn revoke_all_tokens(&self) {
        self.state().tokens.clear();
    }

    fn authorize(state: &MemoryState, actor: &AuthSession) -> Result<UserId, StoreError> {
        match state.tokens.get(actor.access_token().expose_secret()) {
            Some(identity) if identity.id == actor.identity.id => Ok(identity.id),
            _ => Err(StoreError::Rejected {
                message: "JWT expired".to_string(),
                code: Some("PGRST301".to_string()),
            }),
        }
    }

    fn take_write_failure(state: &mut MemoryState) -> Result<(), StoreError> {
        match state.fail_next_write.take() {
            Some(message) => Err(StoreError::Rejected {
                message,
                code: None,
            }),
            None => Ok(()),
        }
    }

    /// Strictly increasing timestamps, so insertion order is recoverable.
    fn next_created_at(state: &mut MemoryState) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match state.last_created_at {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        state.last_created_at = Some(created_at);
        created_at
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let mut state = self.state();
        let id = match state.accounts.get(email) {
            Some((id, stored)) if stored == password.expose_secret() => *id,
            _ => return Err(AuthError::Rejected("Invalid login credentials".to_string())),
        };

        let identity = Identity {
            id,
            email: email.clone(),
        };
        let token = Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), identity.clone());

        Ok(AuthSession::new(
            identity,
            SecretString::from(token),
            Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECS),
        ))
    }

    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<Identity, AuthError> {
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }

        let id = UserId::random();
        state
            .accounts
            .insert(email.clone(), (id, password.expose_secret().to_string()));

        Ok(Identity {
            id,
            email: email.clone(),
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.state()
            .tokens
            .remove(session.access_token().expose_secret());
        Ok(())
    }

    async fn get_session(
        &self,
        access_token: &SecretString,
    ) -> Result<Option<Identity>, AuthError> {
        if self.inner.auth_unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected("auth provider unavailable".to_string()));
        }
        Ok(self
            .state()
            .tokens
            .get(access_token.expose_secret())
            .cloned())
    }
}

#[async_trait]
impl RestaurantStore for MemoryBackend {
    async fn list(&self, scope: ListScope<'_>) -> Result<Vec<Restaurant>, StoreError> {
        self.inner.store_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_reads {
            return Err(StoreError::Rejected {
                message: "read failed".to_string(),
                code: None,
            });
        }

        let owner = match scope {
            ListScope::Everyone => None,
            ListScope::OwnedBy(actor) => Some(Self::authorize(&state, actor)?),
        };

        let mut rows: Vec<Restaurant> = state
            .rows
            .iter()
            .filter(|r| owner.is_none_or(|o| r.created_by == o))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(
        &self,
        actor: &AuthSession,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError> {
        self.inner.store_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        let owner = Self::authorize(&state, actor)?;
        Self::take_write_failure(&mut state)?;

        let row = Restaurant {
            id: RestaurantId::random(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            address: fields.address.clone(),
            phone: fields.phone.clone(),
            email: fields.email.clone(),
            category: fields.category.clone(),
            image_url: fields.image_url.clone(),
            created_by: owner,
            created_at: Self::next_created_at(&mut state),
        };
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        actor: &AuthSession,
        id: RestaurantId,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError> {
        self.inner.store_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        let owner = Self::authorize(&state, actor)?;
        Self::take_write_failure(&mut state)?;

        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id == id && r.created_by == owner)
            .ok_or(StoreError::NotFound)?;

        row.name.clone_from(&fields.name);
        row.description.clone_from(&fields.description);
        row.address.clone_from(&fields.address);
        row.phone.clone_from(&fields.phone);
        row.email.clone_from(&fields.email);
        row.category.clone_from(&fields.category);
        row.image_url.clone_from(&fields.image_url);
        Ok(row.clone())
    }

    async fn delete(&self, actor: &AuthSession, id: RestaurantId) -> Result<(), StoreError> {
        self.inner.store_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        let owner = Self::authorize(&state, actor)?;
        Self::take_write_failure(&mut state)?;

        let before = state.rows.len();
        state
            .rows
            .retain(|r| !(r.id == id && r.created_by == owner));
        if state.rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
