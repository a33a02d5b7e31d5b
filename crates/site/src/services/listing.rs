//! Public listing of every restaurant, newest first.

use tracing::error;

use gastro_serra_core::Restaurant;

use crate::backend::{ListScope, RestaurantStore};

/// Image shown for records without one, and on the empty placeholder card.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/fundo4.svg";

/// What the landing page gallery shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The read did not complete; the page keeps its loading indicator.
    Loading,
    /// The store has no records.
    Empty,
    /// Every record, `created_at` descending.
    Populated(Vec<Restaurant>),
}

impl Listing {
    /// Read all records with one call to the store.
    ///
    /// Read failures are logged and shown as [`Listing::Loading`]; the
    /// landing page never shows an error banner.
    pub async fn load(store: &dyn RestaurantStore) -> Self {
        match store.list(ListScope::Everyone).await {
            Ok(rows) if rows.is_empty() => Self::Empty,
            Ok(rows) => Self::Populated(rows),
            Err(e) => {
                error!(error = %e, "Error loading restaurants");
                Self::Loading
            }
        }
    }

    /// Whether the gallery still shows its loading indicator.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Records to render as cards; empty unless populated.
    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        match self {
            Self::Populated(rows) => rows,
            Self::Loading | Self::Empty => &[],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use gastro_serra_core::{Email, RestaurantFields};

    use super::*;
    use crate::backend::{AuthProvider, MemoryBackend};

    #[tokio::test]
    async fn test_empty_store() {
        let backend = MemoryBackend::new();
        assert_eq!(Listing::load(&backend).await, Listing::Empty);
        assert_eq!(backend.store_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_degrades_to_loading() {
        let backend = MemoryBackend::new();
        backend.fail_reads(true);
        assert_eq!(Listing::load(&backend).await, Listing::Loading);
    }

    #[tokio::test]
    async fn test_lists_every_owner_newest_first() {
        let backend = MemoryBackend::new();
        let password = SecretString::from("segredo1");
        let mut names = Vec::new();

        for (email, name) in [("a@serra.com.br", "Fondue"), ("b@serra.com.br", "Churrasco")] {
            let email = Email::parse(email).unwrap();
            backend.sign_up(&email, &password).await.unwrap();
            let actor = backend.sign_in(&email, &password).await.unwrap();
            backend
                .insert(&actor, &RestaurantFields::named(name))
                .await
                .unwrap();
            names.insert(0, name);
        }

        let Listing::Populated(rows) = Listing::load(&backend).await else {
            panic!("expected populated listing");
        };
        let listed: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(listed, names);
    }
}
