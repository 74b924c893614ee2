//! Staff accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::text::{normalize_email, normalize_name};
use pharmastock_core::validation::not_blank;
use pharmastock_core::{Actor, DirectoryEntry, Entity, UniqueKey, UserId};

use crate::Role;

/// Pharmacy staff member.
///
/// # Invariants
/// - Names are unique after normalization (case, accents, spacing).
/// - Emails are unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: UserId,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl User {
    pub fn register(data: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: data.name.trim().to_string(),
            email: data.email.trim().to_string(),
            role: data.role,
            active: true,
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_string();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }

    /// Identity stamped on the movements this user records.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.name.clone())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DirectoryEntry for User {
    const KIND: &'static str = "user";

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("name", normalize_name(&self.name)),
            UniqueKey::new("email", normalize_email(&self.email)),
        ]
    }
}
