use serde::{Deserialize, Serialize};

use crate::constants::status;

/// Identifier of an item record
pub type ItemId = i64;

/// Item represents a managed record; `status` is rewritten by batch processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub email: String,
}

/// New Item for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub email: String,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        description: Option<&str>,
        status: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.map(str::to_string),
            status: status.into(),
            email: email.into(),
        }
    }

    /// Copy of this item carrying `status`
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn is_processed(&self) -> bool {
        self.status == status::PROCESSED
    }
}

impl NewItem {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: status::NEW.to_string(),
            email: email.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Materialize with the id assigned by the store
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            status: self.status,
            email: self.email,
        }
    }
}
