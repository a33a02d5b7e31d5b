//! Core types for Gastro-Serra.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the web layer and the backend clients.

pub mod draft;
pub mod email;
pub mod id;
pub mod restaurant;

pub use draft::Draft;
pub use email::{Email, EmailError};
pub use id::*;
pub use restaurant::{Restaurant, RestaurantFields};
