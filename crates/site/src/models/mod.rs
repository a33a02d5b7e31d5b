//! Domain models for the site.
//!
//! Restaurant records live in `gastro_serra_core`; this module holds what
//! the web layer keeps in the browser session.

pub mod session;

pub use session::{AuthSession, Identity, keys as session_keys};
