//! Store port - CRUD for characters, sessions, rolls and encounters
//!
//! Writes are not reflected locally by the store; other clients (and this
//! one) see them through push events.

use async_trait::async_trait;
use thiserror::Error;

use vademecum_domain::{Character, CharacterId, Encounter, EncounterId, Roll, Session, SessionId};
use vademecum_shared::{CreateRollRequest, UpdateEncounterRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a failure status and `{detail}` body
    #[error("Store returned {status}: {detail}")]
    Status { status: u16, detail: String },
    /// The request never completed
    #[error("Store request failed: {0}")]
    Transport(String),
    /// The response body could not be decoded
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorePort: Send + Sync {
    // Characters
    async fn create_character(&self) -> Result<Character, StoreError>;
    async fn get_character(&self, id: CharacterId) -> Result<Character, StoreError>;
    async fn update_character(&self, character: &Character) -> Result<Character, StoreError>;
    async fn delete_character(&self, id: CharacterId) -> Result<(), StoreError>;

    // Sessions
    async fn create_session(&self, name: &str) -> Result<Session, StoreError>;
    async fn get_session(&self, id: SessionId) -> Result<Session, StoreError>;
    async fn rename_session(&self, id: SessionId, name: &str) -> Result<Session, StoreError>;
    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError>;
    async fn add_session_character(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Result<Session, StoreError>;
    async fn list_session_characters(&self, session_id: SessionId) -> Result<Vec<Character>, StoreError>;

    // Rolls
    async fn list_session_rolls(&self, session_id: SessionId) -> Result<Vec<Roll>, StoreError>;
    async fn create_session_roll(
        &self,
        session_id: SessionId,
        request: &CreateRollRequest,
    ) -> Result<Roll, StoreError>;
    async fn delete_session_rolls(&self, session_id: SessionId) -> Result<(), StoreError>;

    // Encounters
    async fn list_session_encounters(&self, session_id: SessionId) -> Result<Vec<Encounter>, StoreError>;
    async fn create_session_encounter(&self, session_id: SessionId) -> Result<Encounter, StoreError>;
    async fn update_session_encounter(
        &self,
        session_id: SessionId,
        encounter_id: EncounterId,
        request: &UpdateEncounterRequest,
    ) -> Result<Encounter, StoreError>;
}
