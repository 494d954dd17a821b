//! In-memory record store.
//!
//! Plain keyed storage with no rules of its own; ownership and push fan-out
//! live in [`crate::app::App`].

use dashmap::DashMap;

use vademecum_domain::{
    Character, CharacterId, Encounter, EncounterId, Roll, Session, SessionId,
};

#[derive(Default)]
pub struct MemoryStore {
    characters: DashMap<CharacterId, Character>,
    sessions: DashMap<SessionId, Session>,
    rolls: DashMap<SessionId, Vec<Roll>>,
    encounters: DashMap<SessionId, Vec<Encounter>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Characters

    pub fn character(&self, id: CharacterId) -> Option<Character> {
        self.characters.get(&id).map(|entry| entry.clone())
    }

    pub fn save_character(&self, character: Character) {
        self.characters.insert(character.id, character);
    }

    pub fn remove_character(&self, id: CharacterId) -> Option<Character> {
        let removed = self.characters.remove(&id).map(|(_, character)| character);
        if removed.is_some() {
            for mut session in self.sessions.iter_mut() {
                session.character_ids.retain(|cid| *cid != id);
            }
        }
        removed
    }

    // Sessions

    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    pub fn save_session(&self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    /// Remove a session together with its rolls and encounters.
    pub fn remove_session(&self, id: SessionId) -> Option<Session> {
        self.rolls.remove(&id);
        self.encounters.remove(&id);
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    /// Sessions whose roster contains `character_id`.
    pub fn sessions_with_character(&self, character_id: CharacterId) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|entry| entry.has_character(character_id))
            .map(|entry| entry.id)
            .collect()
    }

    pub fn session_characters(&self, session_id: SessionId) -> Vec<Character> {
        let Some(session) = self.session(session_id) else {
            return Vec::new();
        };
        session
            .character_ids
            .iter()
            .filter_map(|id| self.character(*id))
            .collect()
    }

    // Rolls

    pub fn rolls(&self, session_id: SessionId) -> Vec<Roll> {
        self.rolls
            .get(&session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub fn push_roll(&self, session_id: SessionId, roll: Roll) {
        self.rolls.entry(session_id).or_default().push(roll);
    }

    pub fn clear_rolls(&self, session_id: SessionId) {
        self.rolls.remove(&session_id);
    }

    // Encounters

    pub fn encounters(&self, session_id: SessionId) -> Vec<Encounter> {
        self.encounters
            .get(&session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub fn encounter(&self, session_id: SessionId, encounter_id: EncounterId) -> Option<Encounter> {
        self.encounters
            .get(&session_id)?
            .iter()
            .find(|encounter| encounter.id == encounter_id)
            .cloned()
    }

    /// Insert or replace an encounter within its session.
    pub fn save_encounter(&self, encounter: Encounter) {
        let mut list = self.encounters.entry(encounter.session_id).or_default();
        match list.iter_mut().find(|existing| existing.id == encounter.id) {
            Some(slot) => *slot = encounter,
            None => list.push(encounter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vademecum_domain::UserId;

    #[test]
    fn removing_character_drops_it_from_rosters() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let character = Character::new(owner);
        let mut session = Session::new(owner, "Table");
        session.add_character(character.id);
        store.save_character(character.clone());
        store.save_session(session.clone());

        assert_eq!(store.sessions_with_character(character.id), vec![session.id]);
        store.remove_character(character.id);

        assert!(store.session(session.id).unwrap().character_ids.is_empty());
        assert!(store.session_characters(session.id).is_empty());
    }

    #[test]
    fn removing_session_drops_its_records() {
        let store = MemoryStore::new();
        let session = Session::new(UserId::new(), "Table");
        let encounter = Encounter::seeded(session.id);
        store.save_session(session.clone());
        store.save_encounter(encounter.clone());

        store.remove_session(session.id);

        assert!(store.session(session.id).is_none());
        assert!(store.encounters(session.id).is_empty());
    }

    #[test]
    fn save_encounter_replaces_by_id() {
        let store = MemoryStore::new();
        let session_id = SessionId::new();
        let mut encounter = Encounter::seeded(session_id);
        store.save_encounter(encounter.clone());

        encounter.name = "Crossing".to_string();
        store.save_encounter(encounter.clone());

        assert_eq!(store.encounters(session_id), vec![encounter.clone()]);
        assert_eq!(store.encounter(session_id, encounter.id), Some(encounter));
    }
}
