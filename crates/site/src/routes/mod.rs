//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Landing page with all restaurants
//! GET  /health                            - Health check
//!
//! # Auth
//! GET  /login?mode=login|signup           - Login or sign-up form
//! POST /login                             - Login / sign-up action (rate limited)
//! POST /logout                            - Logout action
//!
//! # Admin (requires auth)
//! GET  /admin                             - Owner's restaurants, form, banner
//! POST /admin/new                         - Open create form
//! GET  /admin/restaurants/{id}/edit       - Open edit form
//! POST /admin/cancel                      - Close form
//! POST /admin/save                        - Submit form
//! GET  /admin/restaurants/{id}/delete     - Delete confirmation
//! POST /admin/restaurants/{id}/delete     - confirm=yes|no
//! ```

pub mod admin;
pub mod auth;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/new", post(admin::open_new))
        .route("/cancel", post(admin::cancel))
        .route("/save", post(admin::save))
        .route("/restaurants/{id}/edit", get(admin::open_edit))
        .route(
            "/restaurants/{id}/delete",
            get(admin::confirm_delete).post(admin::delete),
        )
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route(
            "/login",
            post(auth::submit)
                .layer(login_rate_limiter())
                .get(auth::login_page),
        )
        .route("/logout", post(auth::logout))
        .nest("/admin", admin_routes())
}
