//! Gastro-Serra Core - Shared domain types.
//!
//! This crate provides the types used by the `site` crate and its tests:
//! type-safe identifiers, email addresses, restaurant records and the
//! draft value edited on the admin screen.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The hosted
//! backend is the source of truth for every record; these types describe
//! what travels to and from it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, `Email`, `Restaurant`, `RestaurantFields`, `Draft`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
