//! Restaurant records as stored in the hosted `restaurants` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{RestaurantId, UserId};

/// A row of the `restaurants` table.
///
/// `id`, `created_by` and `created_at` are assigned once at insert and never
/// sent back on update. Optional text columns may be `NULL` in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Identity that created the row.
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// The editable fields of this record, `NULL` columns kept as `None`.
    #[must_use]
    pub fn fields(&self) -> RestaurantFields {
        RestaurantFields {
            name: self.name.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            category: self.category.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// Image URL to display, or `placeholder` when none is set.
    #[must_use]
    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => placeholder,
        }
    }
}

/// The user-editable columns of a restaurant.
///
/// This is exactly the payload of an update and, together with the owner,
/// of an insert. `None` is sent as `NULL`. A submitted form carries every
/// input, so an untouched one arrives as `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An empty input for a column that was `NULL` leaves it `NULL`.
fn keep_null(submitted: Option<String>, previous: Option<&String>) -> Option<String> {
    match (submitted, previous) {
        (Some(value), None) if value.is_empty() => None,
        (submitted, _) => submitted,
    }
}

impl RestaurantFields {
    /// Fields with only a name, everything else empty.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Take `self` as an edit of `previous`: inputs left empty where
    /// `previous` had no value stay `None`, so untouched columns are sent
    /// back unchanged.
    #[must_use]
    pub fn keeping_nulls_of(self, previous: &Self) -> Self {
        Self {
            name: self.name,
            description: keep_null(self.description, previous.description.as_ref()),
            address: keep_null(self.address, previous.address.as_ref()),
            phone: keep_null(self.phone, previous.phone.as_ref()),
            email: keep_null(self.email, previous.email.as_ref()),
            category: keep_null(self.category, previous.category.as_ref()),
            image_url: keep_null(self.image_url, previous.image_url.as_ref()),
        }
    }

    /// Whether the required name is present.
    ///
    /// A name made only of whitespace counts as missing.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}
