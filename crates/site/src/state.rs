//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{AuthProvider, RestaurantStore, SupabaseAuth, SupabaseTable};
use crate::config::SiteConfig;

/// Timeout for every call to the hosted backend.
const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Error creating the backend HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The auth provider and the store are trait
/// objects so the router can run against the hosted backend or in memory.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn RestaurantStore>,
}

impl AppState {
    /// Create state talking to the hosted backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, StateError> {
        let client = reqwest::Client::builder()
            .timeout(BACKEND_TIMEOUT)
            .user_agent(concat!("gastro-serra-site/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let auth = SupabaseAuth::new(client.clone(), &config.supabase);
        let store = SupabaseTable::new(client, &config.supabase);

        Ok(Self::with_backends(config, Arc::new(auth), Arc::new(store)))
    }

    /// Create state over explicit backends.
    #[must_use]
    pub fn with_backends(
        config: SiteConfig,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn RestaurantStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                store,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// The authentication provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// The `restaurants` table.
    #[must_use]
    pub fn store(&self) -> &dyn RestaurantStore {
        self.inner.store.as_ref()
    }
}
