//! Integration tests for Gastro-Serra.
//!
//! Each test spawns the full site app on an ephemeral port, backed by a
//! fresh [`MemoryBackend`], and drives it over HTTP with a cookie-keeping
//! `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gastro-serra-integration-tests
//! ```
//!
//! The login form is rate limited (burst of 5 per client address), so a
//! single [`TestApp`] should not submit it more than five times.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, cookie::Jar, redirect::Policy};
use secrecy::SecretString;
use url::Url;

use gastro_serra_core::{Email, Restaurant, RestaurantFields};
use gastro_serra_site::backend::{AuthProvider, MemoryBackend, RestaurantStore};
use gastro_serra_site::config::{SiteConfig, SupabaseConfig};
use gastro_serra_site::models::AuthSession;
use gastro_serra_site::app;
use gastro_serra_site::state::AppState;

/// Password used for every seeded account.
pub const PASSWORD: &str = "segredo123";

/// A running site plus handles to its backend and an HTTP client.
pub struct TestApp {
    pub addr: SocketAddr,
    pub backend: MemoryBackend,
    /// Follows redirects.
    pub client: Client,
    /// Shares the cookie jar with `client` but returns redirects as-is.
    pub raw: Client,
}

fn test_config() -> SiteConfig {
    SiteConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        supabase: SupabaseConfig {
            url: Url::parse("http://127.0.0.1:9").unwrap(),
            anon_key: SecretString::from("test-anon-key"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestApp {
    /// Start the site on `127.0.0.1:0` over an empty in-memory backend.
    pub async fn spawn() -> Self {
        let backend = MemoryBackend::new();
        let state = AppState::with_backends(
            test_config(),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
        );
        let app = app(state).into_make_service_with_connect_info::<SocketAddr>();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .unwrap();
        let raw = Client::builder()
            .cookie_provider(jar)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            backend,
            client,
            raw,
        }
    }

    /// Absolute URL for `path` on this app.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET `path`, following redirects.
    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET `path`, following redirects, and return the body.
    pub async fn page(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    /// POST a form to `path`, following redirects.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Create an account directly in the backend.
    pub async fn register(&self, email: &str) -> Email {
        let email = Email::parse(email).unwrap();
        self.backend
            .sign_up(&email, &SecretString::from(PASSWORD))
            .await
            .unwrap();
        email
    }

    /// Sign in through the login form; lands on the admin screen.
    pub async fn login(&self, email: &str) -> Response {
        self.post(
            "/login",
            &[("mode", "login"), ("email", email), ("password", PASSWORD)],
        )
        .await
    }

    /// Register and sign in through the login form.
    pub async fn register_and_login(&self, email: &str) {
        self.register(email).await;
        let response = self.login(email).await;
        assert_eq!(response.url().path(), "/admin");
    }

    /// Insert a record as `email` without going through the site.
    pub async fn seed(&self, email: &str, fields: RestaurantFields) -> Restaurant {
        let actor = self.backend_session(email).await;
        self.backend.insert(&actor, &fields).await.unwrap()
    }

    /// A backend session for an already registered account.
    pub async fn backend_session(&self, email: &str) -> AuthSession {
        let email = Email::parse(email).unwrap();
        self.backend
            .sign_in(&email, &SecretString::from(PASSWORD))
            .await
            .unwrap()
    }

    /// The stored row with `name`.
    #[must_use]
    pub fn row(&self, name: &str) -> Option<Restaurant> {
        self.backend.rows().into_iter().find(|r| r.name == name)
    }
}
