//! The unsaved form state of the admin screen.

use serde::{Deserialize, Serialize};

use crate::types::id::RestaurantId;
use crate::types::restaurant::{Restaurant, RestaurantFields};

/// A record being created or edited.
///
/// The target of an edit is carried by the variant rather than by a nullable
/// id inside the payload, so a draft can never be submitted as an update
/// without knowing which row it updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Draft {
    /// A record that does not exist yet.
    New { fields: RestaurantFields },
    /// Changes to an existing record.
    Editing {
        id: RestaurantId,
        fields: RestaurantFields,
    },
}

impl Default for Draft {
    fn default() -> Self {
        Self::New {
            fields: RestaurantFields::default(),
        }
    }
}

impl Draft {
    /// A draft for editing `record`, populated with all of its editable fields.
    #[must_use]
    pub fn editing(record: &Restaurant) -> Self {
        Self::Editing {
            id: record.id,
            fields: record.fields(),
        }
    }

    /// The payload that will be sent to the store.
    #[must_use]
    pub const fn fields(&self) -> &RestaurantFields {
        match self {
            Self::New { fields } | Self::Editing { fields, .. } => fields,
        }
    }

    /// Replace the payload, keeping the draft's target.
    ///
    /// When editing, inputs left empty over a `NULL` column keep it `NULL`.
    pub fn set_fields(&mut self, new_fields: RestaurantFields) {
        match self {
            Self::New { fields } => *fields = new_fields,
            Self::Editing { fields, .. } => *fields = new_fields.keeping_nulls_of(fields),
        }
    }

    /// The record this draft updates, if any.
    #[must_use]
    pub const fn target(&self) -> Option<RestaurantId> {
        match self {
            Self::New { .. } => None,
            Self::Editing { id, .. } => Some(*id),
        }
    }
}
