//! Clients for the hosted backend: authentication and the `restaurants` table.
//!
//! # Architecture
//!
//! - The hosted backend is the source of truth - NO local persistence, direct API calls
//! - Both collaborators sit behind object-safe traits stored in [`AppState`]
//!   so handlers and the admin flow can run against a fake
//! - Token lookups are cached in memory via `moka` (5 minute TTL)
//!
//! # Implementations
//!
//! - [`SupabaseAuth`] / [`SupabaseTable`] - GoTrue and PostgREST over `reqwest`
//! - [`MemoryBackend`] - in-process implementation of both traits for tests
//!
//! [`AppState`]: crate::state::AppState

mod auth;
mod error;
mod memory;
mod table;
pub mod types;

pub use auth::SupabaseAuth;
pub use error::{AuthError, StoreError};
pub use memory::MemoryBackend;
pub use table::SupabaseTable;

use async_trait::async_trait;
use secrecy::SecretString;

use gastro_serra_core::{Email, Restaurant, RestaurantFields, RestaurantId};

use crate::models::{AuthSession, Identity};

/// Which rows a listing read returns.
#[derive(Debug, Clone, Copy)]
pub enum ListScope<'a> {
    /// Every restaurant, read with the anon key (public landing page).
    Everyone,
    /// Only rows created by this session's identity.
    OwnedBy(&'a AuthSession),
}

/// Email/password authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<AuthSession, AuthError>;

    /// Create an account. Does not sign the new identity in.
    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<Identity, AuthError>;

    /// Revoke the session's token at the provider.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;

    /// Resolve a token to its identity, `None` if the provider no longer
    /// accepts it.
    async fn get_session(&self, access_token: &SecretString)
    -> Result<Option<Identity>, AuthError>;
}

/// The hosted `restaurants` table.
///
/// Reads are always ordered by `created_at` descending. Update and delete
/// are scoped to rows owned by `actor`, on top of whatever policy the store
/// enforces itself.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn list(&self, scope: ListScope<'_>) -> Result<Vec<Restaurant>, StoreError>;

    /// Insert a row owned by `actor`'s identity.
    async fn insert(
        &self,
        actor: &AuthSession,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError>;

    /// Overwrite the editable fields of `id`.
    async fn update(
        &self,
        actor: &AuthSession,
        id: RestaurantId,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError>;

    async fn delete(&self, actor: &AuthSession, id: RestaurantId) -> Result<(), StoreError>;
}
