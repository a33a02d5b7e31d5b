//! Stateful flows built on the backend traits.
//!
//! # Services
//!
//! - `session` - Session provider: identity probe, sign-in/up/out
//! - `management` - Owner's admin screen (list, create/edit form, delete)
//! - `listing` - Public landing page gallery

pub mod listing;
pub mod management;
pub mod session;

pub use listing::{Listing, PLACEHOLDER_IMAGE};
pub use management::{Banner, Confirmation, ManagementView, Mode};
pub use session::{IdentityState, SessionProvider};
