//! Acting user identity, denormalized into every ledger entry.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub name: String,
}

impl Actor {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
        }
    }

    /// Identity used for automated operations (e.g. the expired-batch sweep
    /// when triggered without a session).
    pub fn system() -> Self {
        Self {
            user_id: UserId::from_uuid(uuid::Uuid::nil()),
            name: "Sistema".to_string(),
        }
    }
}
