//! Shared play sessions

use serde::{Deserialize, Serialize};

use crate::{CharacterId, DomainError, SessionId, UserId};

/// A shared live context binding characters, encounters and connected clients.
///
/// Encounters and rolls are stored separately and keyed by session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub character_ids: Vec<CharacterId>,
}

impl Session {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            name: name.into(),
            character_ids: Vec::new(),
        }
    }

    pub fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(DomainError::not_owner("Session", self.id.to_string()))
        }
    }

    /// Add a character to the roster. Returns false if already present.
    pub fn add_character(&mut self, character_id: CharacterId) -> bool {
        if self.character_ids.contains(&character_id) {
            return false;
        }
        self.character_ids.push(character_id);
        true
    }

    pub fn has_character(&self, character_id: CharacterId) -> bool {
        self.character_ids.contains(&character_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_character_is_idempotent() {
        let mut session = Session::new(UserId::new(), "Friday game");
        let character_id = CharacterId::new();
        assert!(session.add_character(character_id));
        assert!(!session.add_character(character_id));
        assert_eq!(session.character_ids.len(), 1);
        assert!(session.has_character(character_id));
    }

    #[test]
    fn test_only_owner_may_write() {
        let owner = UserId::new();
        let session = Session::new(owner, "Friday game");
        assert!(session.ensure_owner(owner).is_ok());
        assert!(session.ensure_owner(UserId::new()).is_err());
    }
}
