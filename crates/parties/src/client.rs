use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::text::{normalize_document, normalize_name};
use pharmastock_core::validation::{document_number, not_blank};
use pharmastock_core::{ClientId, DirectoryEntry, Entity, UniqueKey};

use crate::contact::{ContactInfo, non_empty};

/// Pharmacy client (invoice recipient).
///
/// Unique by normalized name and, independently, by normalized document
/// number: either one matching an existing client is a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Client {
    pub id: ClientId,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "document_number"))]
    pub document: String,
    #[validate(nested)]
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub document: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Client {
    pub fn register(data: NewClient, now: DateTime<Utc>) -> Self {
        Self {
            id: ClientId::new(),
            name: data.name.trim().to_string(),
            document: data.document.trim().to_string(),
            contact: data.contact.tidy(),
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(document) = patch.document {
            self.document = document.trim().to_string();
        }
        if patch.phone.is_some() {
            self.contact.phone = non_empty(patch.phone);
        }
        if patch.email.is_some() {
            self.contact.email = non_empty(patch.email);
        }
        if patch.address.is_some() {
            self.contact.address = non_empty(patch.address);
        }
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DirectoryEntry for Client {
    const KIND: &'static str = "client";

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("name", normalize_name(&self.name)),
            UniqueKey::new("document", normalize_document(&self.document)),
        ]
    }
}
