//! Session service: the live session connection plus pull-through reads.
//!
//! Reads fill the shared [`SessionCache`] from the store on first access and
//! are kept fresh by push events afterwards. Writes go straight to the store;
//! their effect arrives back through the push connection.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use vademecum_domain::{Character, CharacterId, Encounter, EncounterId, Roll, Session, SessionId};
use vademecum_shared::{CreateRollRequest, UpdateEncounterRequest};

use crate::application::ServiceError;
use crate::infrastructure::cache::{CacheUpdate, SessionCache};
use crate::infrastructure::websocket::{ConnectionManager, ConnectionState};
use crate::ports::outbound::StorePort;

pub struct SessionService {
    store: Arc<dyn StorePort>,
    cache: Arc<SessionCache>,
    connection: ConnectionManager,
}

impl SessionService {
    pub fn new(store: Arc<dyn StorePort>, cache: Arc<SessionCache>, connection: ConnectionManager) -> Self {
        Self {
            store,
            cache,
            connection,
        }
    }

    // ---------- connection ----------

    /// Open the push connection for `session_id`, replacing any other.
    pub async fn connect(&self, session_id: SessionId) -> Result<(), ServiceError> {
        self.connection.connect(session_id).await?;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe_state()
    }

    /// Change notifications for cached views.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<CacheUpdate> {
        self.cache.subscribe()
    }

    pub async fn current_session(&self) -> Option<SessionId> {
        self.connection.current_session().await
    }

    // ---------- sessions ----------

    pub async fn create_session(&self, name: &str) -> Result<Session, ServiceError> {
        let session = self.store.create_session(name).await?;
        tracing::info!(session_id = %session.id, "Created session");
        Ok(session)
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Session, ServiceError> {
        Ok(self.store.get_session(session_id).await?)
    }

    pub async fn rename_session(&self, session_id: SessionId, name: &str) -> Result<Session, ServiceError> {
        Ok(self.store.rename_session(session_id, name).await?)
    }

    /// Delete a session, leaving it first if it is the live one.
    pub async fn delete_session(&self, session_id: SessionId) -> Result<(), ServiceError> {
        if self.current_session().await == Some(session_id) {
            self.disconnect().await;
        }
        self.store.delete_session(session_id).await?;
        self.cache.evict_session(session_id).await;
        Ok(())
    }

    /// Bring a character into a session.
    pub async fn add_character(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Result<Session, ServiceError> {
        Ok(self.store.add_session_character(session_id, character_id).await?)
    }

    // ---------- reads ----------

    pub async fn characters(&self, session_id: SessionId) -> Result<Vec<Character>, ServiceError> {
        if let Some(characters) = self.cache.session_characters(session_id).await {
            return Ok(characters);
        }
        let characters = self.store.list_session_characters(session_id).await?;
        self.cache
            .put_session_characters(session_id, characters.clone())
            .await;
        Ok(characters)
    }

    pub async fn character(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Result<Character, ServiceError> {
        if let Some(character) = self.cache.session_character(session_id, character_id).await {
            return Ok(character);
        }
        let character = self.store.get_character(character_id).await?;
        self.cache
            .put_session_character(session_id, character.clone())
            .await;
        Ok(character)
    }

    /// Session roll log, newest first.
    pub async fn rolls(&self, session_id: SessionId) -> Result<Vec<Roll>, ServiceError> {
        if let Some(rolls) = self.cache.rolls(session_id).await {
            return Ok(rolls);
        }
        let rolls = self.store.list_session_rolls(session_id).await?;
        self.cache.put_rolls(session_id, rolls).await;
        Ok(self.cache.rolls(session_id).await.unwrap_or_default())
    }

    pub async fn encounters(&self, session_id: SessionId) -> Result<Vec<Encounter>, ServiceError> {
        if let Some(encounters) = self.cache.encounters(session_id).await {
            return Ok(encounters);
        }
        let encounters = self.store.list_session_encounters(session_id).await?;
        self.cache.put_encounters(session_id, encounters.clone()).await;
        Ok(encounters)
    }

    pub async fn encounter(
        &self,
        session_id: SessionId,
        encounter_id: EncounterId,
    ) -> Result<Option<Encounter>, ServiceError> {
        if let Some(encounter) = self.cache.encounter(session_id, encounter_id).await {
            return Ok(Some(encounter));
        }
        let encounter = self
            .encounters(session_id)
            .await?
            .into_iter()
            .find(|encounter| encounter.id == encounter_id);
        if let Some(encounter) = &encounter {
            self.cache.put_encounter(session_id, encounter.clone()).await;
        }
        Ok(encounter)
    }

    // ---------- writes ----------

    /// Post a finished roll to the session log.
    pub async fn post_roll(&self, session_id: SessionId, roll: &Roll) -> Result<Roll, ServiceError> {
        let request = CreateRollRequest {
            character_id: roll.character_id,
            label: roll.label.clone(),
            dice: roll.dice.clone(),
            evaluation: roll.evaluation,
        };
        let posted = self.store.create_session_roll(session_id, &request).await?;
        tracing::debug!(session_id = %session_id, roll_id = %posted.id, "Posted roll");
        Ok(posted)
    }

    pub async fn clear_rolls(&self, session_id: SessionId) -> Result<(), ServiceError> {
        Ok(self.store.delete_session_rolls(session_id).await?)
    }

    pub async fn create_encounter(&self, session_id: SessionId) -> Result<Encounter, ServiceError> {
        Ok(self.store.create_session_encounter(session_id).await?)
    }

    pub async fn update_encounter(&self, encounter: &Encounter) -> Result<Encounter, ServiceError> {
        let request = UpdateEncounterRequest {
            name: encounter.name.clone(),
            turn: encounter.turn,
            hidden: encounter.hidden,
            participants: encounter.participants.clone(),
        };
        Ok(self
            .store
            .update_session_encounter(encounter.session_id, encounter.id, &request)
            .await?)
    }
}
