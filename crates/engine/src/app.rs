//! Application composition and the record-store use cases.
//!
//! Every write that other clients need to see is fanned out as a push event
//! to the connections following the affected session.

use std::sync::Arc;

use vademecum_domain::{
    Character, CharacterId, DomainError, Encounter, EncounterId, Roll, RollId, Session,
    SessionId, UserId, DIE_SIDES,
};
use vademecum_shared::{CreateRollRequest, ServerEvent, UpdateEncounterRequest};

use crate::api::connections::ConnectionManager;
use crate::infrastructure::ports::ClockPort;
use crate::infrastructure::MemoryStore;

pub struct App {
    store: MemoryStore,
    connections: Arc<ConnectionManager>,
    clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn new(connections: Arc<ConnectionManager>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            store: MemoryStore::new(),
            connections,
            clock,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    fn require_session(&self, id: SessionId) -> Result<Session, DomainError> {
        self.store
            .session(id)
            .ok_or_else(|| DomainError::not_found("Session", id.to_string()))
    }

    fn require_character(&self, id: CharacterId) -> Result<Character, DomainError> {
        self.store
            .character(id)
            .ok_or_else(|| DomainError::not_found("Character", id.to_string()))
    }

    fn owned_session(&self, user_id: UserId, id: SessionId) -> Result<Session, DomainError> {
        let session = self.require_session(id)?;
        session.ensure_owner(user_id)?;
        Ok(session)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn create_session(&self, user_id: UserId, name: &str) -> Result<Session, DomainError> {
        let session = Session::new(user_id, validated_name(name)?);
        self.store.save_session(session.clone());
        tracing::info!(session_id = %session.id, user_id = %user_id, "Session created");
        Ok(session)
    }

    pub fn get_session(&self, id: SessionId) -> Result<Session, DomainError> {
        self.require_session(id)
    }

    pub fn rename_session(&self, user_id: UserId, id: SessionId, name: &str) -> Result<Session, DomainError> {
        let mut session = self.owned_session(user_id, id)?;
        session.name = validated_name(name)?;
        self.store.save_session(session.clone());
        Ok(session)
    }

    pub fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), DomainError> {
        self.owned_session(user_id, id)?;
        self.store.remove_session(id);
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Add a character to a session's roster. Allowed for the character's
    /// owner and the session owner.
    pub async fn add_session_character(
        &self,
        user_id: UserId,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Result<Session, DomainError> {
        let mut session = self.require_session(session_id)?;
        let character = self.require_character(character_id)?;
        if !character.is_owned_by(user_id) {
            session.ensure_owner(user_id)?;
        }

        if session.add_character(character_id) {
            self.store.save_session(session.clone());
            self.connections
                .broadcast_to_session(session_id, &ServerEvent::CharacterUpdated(character))
                .await;
            tracing::info!(session_id = %session_id, character_id = %character_id, "Character joined session");
        }
        Ok(session)
    }

    pub fn session_characters(&self, session_id: SessionId) -> Result<Vec<Character>, DomainError> {
        self.require_session(session_id)?;
        Ok(self.store.session_characters(session_id))
    }

    // =========================================================================
    // Rolls
    // =========================================================================

    pub fn rolls(&self, session_id: SessionId) -> Result<Vec<Roll>, DomainError> {
        self.require_session(session_id)?;
        Ok(self.store.rolls(session_id))
    }

    /// Record a roll made by a character in the session.
    pub async fn create_roll(
        &self,
        user_id: UserId,
        session_id: SessionId,
        request: CreateRollRequest,
    ) -> Result<Roll, DomainError> {
        let session = self.require_session(session_id)?;
        let character = self.require_character(request.character_id)?;
        if !session.has_character(character.id) {
            return Err(DomainError::constraint(format!(
                "Character {} is not part of session {}",
                character.id, session_id
            )));
        }
        if !character.is_owned_by(user_id) {
            session.ensure_owner(user_id)?;
        }
        if let Some(die) = request.dice.iter().find(|die| !(1..=DIE_SIDES).contains(*die)) {
            return Err(DomainError::validation(format!("Invalid die value {die}")));
        }

        let roll = Roll {
            id: RollId::new(),
            character_id: character.id,
            label: request.label,
            dice: request.dice,
            evaluation: request.evaluation,
            timestamp: self.clock.now(),
        };
        self.store.push_roll(session_id, roll.clone());
        self.connections
            .broadcast_to_session(session_id, &ServerEvent::RollCreated(roll.clone()))
            .await;
        Ok(roll)
    }

    pub async fn clear_rolls(&self, user_id: UserId, session_id: SessionId) -> Result<(), DomainError> {
        self.owned_session(user_id, session_id)?;
        self.store.clear_rolls(session_id);
        self.connections
            .broadcast_to_session(session_id, &ServerEvent::RollsDeleted)
            .await;
        Ok(())
    }

    // =========================================================================
    // Encounters
    // =========================================================================

    pub fn encounters(&self, session_id: SessionId) -> Result<Vec<Encounter>, DomainError> {
        self.require_session(session_id)?;
        Ok(self.store.encounters(session_id))
    }

    /// Create a hidden, empty encounter.
    pub async fn create_encounter(&self, user_id: UserId, session_id: SessionId) -> Result<Encounter, DomainError> {
        self.owned_session(user_id, session_id)?;
        let encounter = Encounter::seeded(session_id);
        self.store.save_encounter(encounter.clone());
        self.connections
            .broadcast_to_session(session_id, &ServerEvent::EncounterUpdated(encounter.clone()))
            .await;
        Ok(encounter)
    }

    pub async fn update_encounter(
        &self,
        user_id: UserId,
        session_id: SessionId,
        encounter_id: EncounterId,
        request: UpdateEncounterRequest,
    ) -> Result<Encounter, DomainError> {
        self.owned_session(user_id, session_id)?;
        let mut encounter = self
            .store
            .encounter(session_id, encounter_id)
            .ok_or_else(|| DomainError::not_found("Encounter", encounter_id.to_string()))?;

        if !request.participants.is_empty() && request.turn as usize >= request.participants.len() {
            return Err(DomainError::validation(format!(
                "Turn {} is out of range for {} participants",
                request.turn,
                request.participants.len()
            )));
        }

        encounter.name = request.name;
        encounter.turn = request.turn;
        encounter.hidden = request.hidden;
        encounter.participants = request.participants;
        self.store.save_encounter(encounter.clone());
        self.connections
            .broadcast_to_session(session_id, &ServerEvent::EncounterUpdated(encounter.clone()))
            .await;
        Ok(encounter)
    }

    // =========================================================================
    // Characters
    // =========================================================================

    pub fn create_character(&self, user_id: UserId) -> Character {
        let character = Character::new(user_id);
        self.store.save_character(character.clone());
        tracing::info!(character_id = %character.id, user_id = %user_id, "Character created");
        character
    }

    pub fn get_character(&self, id: CharacterId) -> Result<Character, DomainError> {
        self.require_character(id)
    }

    /// Replace a character sheet. Identity and ownership are kept from the
    /// stored record.
    pub async fn update_character(
        &self,
        user_id: UserId,
        id: CharacterId,
        mut character: Character,
    ) -> Result<Character, DomainError> {
        let existing = self.require_character(id)?;
        existing.ensure_owner(user_id)?;
        character.validate()?;

        character.id = existing.id;
        character.user_id = existing.user_id;
        self.store.save_character(character.clone());

        for session_id in self.store.sessions_with_character(id) {
            self.connections
                .broadcast_to_session(session_id, &ServerEvent::CharacterUpdated(character.clone()))
                .await;
        }
        Ok(character)
    }

    pub fn delete_character(&self, user_id: UserId, id: CharacterId) -> Result<(), DomainError> {
        self.require_character(id)?.ensure_owner(user_id)?;
        self.store.remove_character(id);
        tracing::info!(character_id = %id, "Character deleted");
        Ok(())
    }
}

fn validated_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Session name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;
    use vademecum_domain::{ConnectionId, RollEvaluation, MAX_LEVEL};

    use crate::api::connections::ConnectionInfo;
    use crate::infrastructure::ports::MockClockPort;

    fn app() -> App {
        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        App::new(Arc::new(ConnectionManager::new()), Arc::new(clock))
    }

    async fn follow(app: &App, session_id: SessionId) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(16);
        let info = ConnectionInfo {
            connection_id: ConnectionId::new(),
            user_id: UserId::new(),
            session_id,
        };
        app.connections().register(info, tx).await;
        rx
    }

    fn next_event(rx: &mut mpsc::Receiver<String>) -> ServerEvent {
        ServerEvent::decode(&rx.try_recv().unwrap()).unwrap()
    }

    fn roll_request(character_id: CharacterId, dice: Vec<u8>) -> CreateRollRequest {
        CreateRollRequest {
            character_id,
            label: "Power".to_string(),
            dice,
            evaluation: RollEvaluation::Check,
        }
    }

    #[tokio::test]
    async fn roll_is_stamped_stored_and_broadcast() {
        let app = app();
        let gm = UserId::new();
        let player = UserId::new();
        let session = app.create_session(gm, "Table").unwrap();
        let character = app.create_character(player);
        app.add_session_character(player, session.id, character.id)
            .await
            .unwrap();
        let mut rx = follow(&app, session.id).await;

        let roll = app
            .create_roll(player, session.id, roll_request(character.id, vec![2, 6]))
            .await
            .unwrap();

        assert_eq!(roll.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(app.rolls(session.id).unwrap(), vec![roll.clone()]);
        assert_eq!(next_event(&mut rx), ServerEvent::RollCreated(roll));
    }

    #[tokio::test]
    async fn roll_requires_roster_membership_and_valid_dice() {
        let app = app();
        let user = UserId::new();
        let session = app.create_session(user, "Table").unwrap();
        let character = app.create_character(user);

        let outside = app
            .create_roll(user, session.id, roll_request(character.id, vec![3]))
            .await;
        assert!(matches!(outside, Err(DomainError::Constraint(_))));

        app.add_session_character(user, session.id, character.id)
            .await
            .unwrap();
        let bad_die = app
            .create_roll(user, session.id, roll_request(character.id, vec![7]))
            .await;
        assert!(matches!(bad_die, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn seeded_encounter_is_hidden_and_empty() {
        let app = app();
        let gm = UserId::new();
        let session = app.create_session(gm, "Table").unwrap();
        let mut rx = follow(&app, session.id).await;

        let encounter = app.create_encounter(gm, session.id).await.unwrap();

        assert!(encounter.hidden);
        assert!(encounter.name.is_empty());
        assert!(encounter.participants.is_empty());
        assert_eq!(encounter.turn, 0);
        assert_eq!(next_event(&mut rx), ServerEvent::EncounterUpdated(encounter));
    }

    #[tokio::test]
    async fn only_owner_manages_encounters_and_rolls() {
        let app = app();
        let gm = UserId::new();
        let stranger = UserId::new();
        let session = app.create_session(gm, "Table").unwrap();
        let encounter = app.create_encounter(gm, session.id).await.unwrap();

        let update = UpdateEncounterRequest {
            name: "Ambush".to_string(),
            turn: 0,
            hidden: false,
            participants: vec![],
        };
        assert!(matches!(
            app.update_encounter(stranger, session.id, encounter.id, update.clone())
                .await,
            Err(DomainError::NotOwner { .. })
        ));
        assert!(matches!(
            app.clear_rolls(stranger, session.id).await,
            Err(DomainError::NotOwner { .. })
        ));

        let updated = app
            .update_encounter(gm, session.id, encounter.id, update)
            .await
            .unwrap();
        assert_eq!(updated.name, "Ambush");
        assert!(!updated.hidden);
    }

    #[tokio::test]
    async fn encounter_turn_must_point_at_participant() {
        let app = app();
        let gm = UserId::new();
        let session = app.create_session(gm, "Table").unwrap();
        let encounter = app.create_encounter(gm, session.id).await.unwrap();

        let request = UpdateEncounterRequest {
            name: "Duel".to_string(),
            turn: 1,
            hidden: false,
            participants: vec![vademecum_domain::Participant::Combatant {
                name: "Bandit".to_string(),
                initiative: Some(3),
                health_points: 8,
                max_health_points: 8,
            }],
        };

        let result = app.update_encounter(gm, session.id, encounter.id, request).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn character_update_reaches_every_session_containing_it() {
        let app = app();
        let player = UserId::new();
        let first = app.create_session(UserId::new(), "First").unwrap();
        let second = app.create_session(UserId::new(), "Second").unwrap();
        let unrelated = app.create_session(UserId::new(), "Other").unwrap();
        let character = app.create_character(player);
        app.add_session_character(player, first.id, character.id).await.unwrap();
        app.add_session_character(player, second.id, character.id).await.unwrap();
        let mut first_rx = follow(&app, first.id).await;
        let mut second_rx = follow(&app, second.id).await;
        let mut unrelated_rx = follow(&app, unrelated.id).await;

        let mut edited = character.clone();
        edited.name = "Ysolde".to_string();
        let saved = app
            .update_character(player, character.id, edited)
            .await
            .unwrap();

        assert_eq!(next_event(&mut first_rx), ServerEvent::CharacterUpdated(saved.clone()));
        assert_eq!(next_event(&mut second_rx), ServerEvent::CharacterUpdated(saved));
        assert!(unrelated_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn character_update_keeps_identity_and_checks_owner() {
        let app = app();
        let owner = UserId::new();
        let character = app.create_character(owner);

        let mut forged = character.clone();
        forged.user_id = UserId::new();
        let saved = app.update_character(owner, character.id, forged).await.unwrap();
        assert_eq!(saved.user_id, owner);

        let result = app
            .update_character(UserId::new(), character.id, character.clone())
            .await;
        assert!(matches!(result, Err(DomainError::NotOwner { .. })));

        let mut too_high = character.clone();
        too_high.level = MAX_LEVEL + 1;
        let result = app.update_character(owner, character.id, too_high).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn out_of_bounds_sheet_is_rejected_and_not_broadcast() {
        let app = app();
        let owner = UserId::new();
        let session = app.create_session(owner, "Table").unwrap();
        let character = app.create_character(owner);
        app.add_session_character(owner, session.id, character.id).await.unwrap();
        let mut rx = follow(&app, session.id).await;

        let mut strong = character.clone();
        strong.attributes.strength.value = 9;
        let mut skilled = character.clone();
        if let Some(skill) = skilled.attributes.charisma.skills.values_mut().next() {
            skill.value = 5;
        }
        let mut hoarder = character.clone();
        hoarder.level_points = 7;

        for sheet in [strong, skilled, hoarder] {
            let result = app.update_character(owner, character.id, sheet).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
        assert_eq!(app.get_character(character.id).unwrap(), character);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn adding_character_twice_broadcasts_once() {
        let app = app();
        let player = UserId::new();
        let session = app.create_session(UserId::new(), "Table").unwrap();
        let character = app.create_character(player);
        let mut rx = follow(&app, session.id).await;

        app.add_session_character(player, session.id, character.id).await.unwrap();
        let again = app.add_session_character(player, session.id, character.id).await.unwrap();

        assert_eq!(again.character_ids, vec![character.id]);
        assert!(matches!(next_event(&mut rx), ServerEvent::CharacterUpdated(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn session_rename_and_delete_are_owner_only() {
        let app = app();
        let owner = UserId::new();
        let session = app.create_session(owner, "  Table  ").unwrap();
        assert_eq!(session.name, "Table");

        assert!(app.rename_session(UserId::new(), session.id, "Mine").is_err());
        assert!(matches!(
            app.rename_session(owner, session.id, " "),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(app.rename_session(owner, session.id, "Keep").unwrap().name, "Keep");

        app.delete_session(owner, session.id).unwrap();
        assert!(matches!(
            app.get_session(session.id),
            Err(DomainError::NotFound { .. })
        ));
    }
}
