//! Session cache fed by push events.
//!
//! Lists are keyed by session; single entities by (session, id), plus one
//! entry per character. Readers fill entries on demand from the store; push
//! events only ever touch entries that are already present, so an event for
//! something nobody has read yet is dropped.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};

use vademecum_domain::{
    sort_newest_first, Character, CharacterId, Encounter, EncounterId, Roll, SessionId,
};
use vademecum_shared::ServerEvent;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Announces which cached view changed after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    Rolls {
        session_id: SessionId,
    },
    Encounter {
        session_id: SessionId,
        encounter_id: EncounterId,
    },
    Character {
        session_id: SessionId,
        character_id: CharacterId,
    },
}

#[derive(Default)]
struct CacheState {
    session_rolls: HashMap<SessionId, Vec<Roll>>,
    session_characters: HashMap<SessionId, Vec<Character>>,
    session_encounters: HashMap<SessionId, Vec<Encounter>>,
    session_character: HashMap<(SessionId, CharacterId), Character>,
    encounters: HashMap<(SessionId, EncounterId), Encounter>,
    characters: HashMap<CharacterId, Character>,
}

impl CacheState {
    fn apply(&mut self, session_id: SessionId, event: &ServerEvent) -> Option<CacheUpdate> {
        match event {
            ServerEvent::RollCreated(roll) => {
                let rolls = self.session_rolls.get_mut(&session_id)?;
                rolls.push(roll.clone());
                Some(CacheUpdate::Rolls { session_id })
            }
            ServerEvent::RollsDeleted => {
                let rolls = self.session_rolls.get_mut(&session_id)?;
                rolls.clear();
                Some(CacheUpdate::Rolls { session_id })
            }
            ServerEvent::EncounterUpdated(encounter) => {
                let key = (session_id, encounter.id);
                let mut touched = false;
                if let Some(list) = self.session_encounters.get_mut(&session_id) {
                    upsert(list, encounter.clone(), |e| e.id == encounter.id);
                    touched = true;
                }
                if let Some(entry) = self.encounters.get_mut(&key) {
                    *entry = encounter.clone();
                    touched = true;
                }
                touched.then_some(CacheUpdate::Encounter {
                    session_id,
                    encounter_id: encounter.id,
                })
            }
            ServerEvent::CharacterUpdated(character) => {
                let mut touched = false;
                if let Some(list) = self.session_characters.get_mut(&session_id) {
                    upsert(list, character.clone(), |c| c.id == character.id);
                    touched = true;
                }
                if let Some(entry) = self.session_character.get_mut(&(session_id, character.id)) {
                    *entry = character.clone();
                    touched = true;
                }
                if let Some(entry) = self.characters.get_mut(&character.id) {
                    *entry = character.clone();
                    touched = true;
                }
                touched.then_some(CacheUpdate::Character {
                    session_id,
                    character_id: character.id,
                })
            }
            ServerEvent::Pong | ServerEvent::Unknown(_) => None,
        }
    }

    /// Store a character written by this client and refresh every session
    /// view already holding it. Returns the sessions whose views changed.
    fn upsert_character(&mut self, character: &Character) -> Vec<SessionId> {
        let mut sessions = Vec::new();
        for (session_id, list) in self.session_characters.iter_mut() {
            if let Some(slot) = list.iter_mut().find(|c| c.id == character.id) {
                *slot = character.clone();
                sessions.push(*session_id);
            }
        }
        for ((session_id, character_id), entry) in self.session_character.iter_mut() {
            if *character_id == character.id {
                *entry = character.clone();
                if !sessions.contains(session_id) {
                    sessions.push(*session_id);
                }
            }
        }
        self.characters.insert(character.id, character.clone());
        sessions
    }
}

fn upsert<T>(list: &mut Vec<T>, value: T, same: impl Fn(&T) -> bool) {
    match list.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = value,
        None => list.push(value),
    }
}

/// Thread-safe cache shared by the connection reader and the services.
pub struct SessionCache {
    state: RwLock<CacheState>,
    updates: broadcast::Sender<CacheUpdate>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(CacheState::default()),
            updates,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.updates.subscribe()
    }

    /// Merge a push event received on `session_id`'s connection.
    ///
    /// Returns what changed, or `None` if nothing relevant was cached.
    pub async fn apply(&self, session_id: SessionId, event: &ServerEvent) -> Option<CacheUpdate> {
        let update = self.state.write().await.apply(session_id, event);
        if let Some(update) = update {
            // No subscribers is fine
            let _ = self.updates.send(update);
        }
        update
    }

    /// Session roll log, newest first.
    pub async fn rolls(&self, session_id: SessionId) -> Option<Vec<Roll>> {
        let guard = self.state.read().await;
        guard.session_rolls.get(&session_id).map(|rolls| {
            let mut rolls = rolls.clone();
            sort_newest_first(&mut rolls);
            rolls
        })
    }

    pub async fn put_rolls(&self, session_id: SessionId, rolls: Vec<Roll>) {
        self.state.write().await.session_rolls.insert(session_id, rolls);
    }

    pub async fn session_characters(&self, session_id: SessionId) -> Option<Vec<Character>> {
        self.state.read().await.session_characters.get(&session_id).cloned()
    }

    pub async fn put_session_characters(&self, session_id: SessionId, characters: Vec<Character>) {
        self.state
            .write()
            .await
            .session_characters
            .insert(session_id, characters);
    }

    pub async fn session_character(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Option<Character> {
        self.state
            .read()
            .await
            .session_character
            .get(&(session_id, character_id))
            .cloned()
    }

    pub async fn put_session_character(&self, session_id: SessionId, character: Character) {
        self.state
            .write()
            .await
            .session_character
            .insert((session_id, character.id), character);
    }

    pub async fn encounters(&self, session_id: SessionId) -> Option<Vec<Encounter>> {
        self.state.read().await.session_encounters.get(&session_id).cloned()
    }

    pub async fn put_encounters(&self, session_id: SessionId, encounters: Vec<Encounter>) {
        self.state
            .write()
            .await
            .session_encounters
            .insert(session_id, encounters);
    }

    pub async fn encounter(&self, session_id: SessionId, encounter_id: EncounterId) -> Option<Encounter> {
        self.state
            .read()
            .await
            .encounters
            .get(&(session_id, encounter_id))
            .cloned()
    }

    pub async fn put_encounter(&self, session_id: SessionId, encounter: Encounter) {
        self.state
            .write()
            .await
            .encounters
            .insert((session_id, encounter.id), encounter);
    }

    pub async fn character(&self, character_id: CharacterId) -> Option<Character> {
        self.state.read().await.characters.get(&character_id).cloned()
    }

    pub async fn put_character(&self, character: Character) {
        self.state.write().await.characters.insert(character.id, character);
    }

    /// Record a character this client just persisted.
    ///
    /// Unlike a push event this always stores the per-character entry, so the
    /// next edit starts from the persisted sheet even when no session is
    /// connected.
    pub async fn upsert_character(&self, character: &Character) {
        let sessions = self.state.write().await.upsert_character(character);
        for session_id in sessions {
            let _ = self.updates.send(CacheUpdate::Character {
                session_id,
                character_id: character.id,
            });
        }
    }

    /// Drop every entry belonging to `session_id`.
    pub async fn evict_session(&self, session_id: SessionId) {
        let mut guard = self.state.write().await;
        guard.session_rolls.remove(&session_id);
        guard.session_characters.remove(&session_id);
        guard.session_encounters.remove(&session_id);
        guard.session_character.retain(|(sid, _), _| *sid != session_id);
        guard.encounters.retain(|(sid, _), _| *sid != session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use vademecum_domain::{DiceFactor, RollEvaluation, UserId};

    fn roll_at(minutes_ago: i64) -> Roll {
        Roll::roll(
            CharacterId::new(),
            "Agility",
            &[DiceFactor::new("Dexterity", 2)],
            RollEvaluation::Check,
            Utc::now() - Duration::minutes(minutes_ago),
            || 3,
        )
    }

    #[tokio::test]
    async fn roll_created_without_cached_log_is_noop() {
        let cache = SessionCache::new();
        let session = SessionId::new();

        let update = cache.apply(session, &ServerEvent::RollCreated(roll_at(0))).await;

        assert_eq!(update, None);
        assert_eq!(cache.rolls(session).await, None);
    }

    #[tokio::test]
    async fn roll_created_appends_and_reads_newest_first() {
        let cache = SessionCache::new();
        let session = SessionId::new();
        let old = roll_at(10);
        cache.put_rolls(session, vec![old.clone()]).await;

        let fresh = roll_at(0);
        let update = cache.apply(session, &ServerEvent::RollCreated(fresh.clone())).await;

        assert_eq!(update, Some(CacheUpdate::Rolls { session_id: session }));
        assert_eq!(cache.rolls(session).await, Some(vec![fresh, old]));
    }

    #[tokio::test]
    async fn rolls_deleted_empties_only_cached_logs() {
        let cache = SessionCache::new();
        let cached = SessionId::new();
        let uncached = SessionId::new();
        cache.put_rolls(cached, vec![roll_at(1), roll_at(2)]).await;

        cache.apply(cached, &ServerEvent::RollsDeleted).await;
        let none = cache.apply(uncached, &ServerEvent::RollsDeleted).await;

        assert_eq!(cache.rolls(cached).await, Some(vec![]));
        assert_eq!(none, None);
        assert_eq!(cache.rolls(uncached).await, None);
    }

    #[tokio::test]
    async fn encounter_updated_upserts_list_and_single_entry() {
        let cache = SessionCache::new();
        let session = SessionId::new();
        let mut encounter = Encounter::seeded(session);
        cache.put_encounters(session, vec![encounter.clone()]).await;
        cache.put_encounter(session, encounter.clone()).await;

        encounter.name = "Ambush".to_string();
        encounter.hidden = false;
        cache
            .apply(session, &ServerEvent::EncounterUpdated(encounter.clone()))
            .await;

        assert_eq!(cache.encounters(session).await, Some(vec![encounter.clone()]));
        assert_eq!(cache.encounter(session, encounter.id).await, Some(encounter.clone()));

        let another = Encounter::seeded(session);
        cache
            .apply(session, &ServerEvent::EncounterUpdated(another.clone()))
            .await;
        assert_eq!(cache.encounters(session).await.map(|list| list.len()), Some(2));
        assert_eq!(cache.encounter(session, another.id).await, None);
    }

    #[tokio::test]
    async fn character_updated_reaches_every_cached_view() {
        let cache = SessionCache::new();
        let session = SessionId::new();
        let mut character = Character::new(UserId::new());
        cache.put_session_characters(session, vec![character.clone()]).await;
        cache.put_session_character(session, character.clone()).await;
        cache.put_character(character.clone()).await;
        let mut updates = cache.subscribe();

        character.name = "Brannoc".to_string();
        cache
            .apply(session, &ServerEvent::CharacterUpdated(character.clone()))
            .await;

        assert_eq!(cache.session_characters(session).await, Some(vec![character.clone()]));
        assert_eq!(
            cache.session_character(session, character.id).await,
            Some(character.clone())
        );
        assert_eq!(cache.character(character.id).await, Some(character.clone()));
        assert_eq!(
            updates.recv().await.unwrap(),
            CacheUpdate::Character {
                session_id: session,
                character_id: character.id
            }
        );
    }

    #[tokio::test]
    async fn local_write_refreshes_views_holding_the_character() {
        let cache = SessionCache::new();
        let holding = SessionId::new();
        let other = SessionId::new();
        let mut character = Character::new(UserId::new());
        let stranger = Character::new(UserId::new());
        cache.put_session_characters(holding, vec![character.clone()]).await;
        cache.put_session_character(holding, character.clone()).await;
        cache.put_session_characters(other, vec![stranger.clone()]).await;
        let mut updates = cache.subscribe();

        character.name = "Ysolde".to_string();
        cache.upsert_character(&character).await;

        assert_eq!(cache.character(character.id).await, Some(character.clone()));
        assert_eq!(cache.session_characters(holding).await, Some(vec![character.clone()]));
        assert_eq!(
            cache.session_character(holding, character.id).await,
            Some(character.clone())
        );
        assert_eq!(cache.session_characters(other).await, Some(vec![stranger]));
        assert_eq!(
            updates.recv().await.unwrap(),
            CacheUpdate::Character {
                session_id: holding,
                character_id: character.id
            }
        );
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn pong_and_unknown_events_change_nothing() {
        let cache = SessionCache::new();
        let session = SessionId::new();
        cache.put_rolls(session, vec![]).await;

        assert_eq!(cache.apply(session, &ServerEvent::Pong).await, None);
        assert_eq!(
            cache
                .apply(session, &ServerEvent::Unknown("MAP_UPDATED".to_string()))
                .await,
            None
        );
        assert_eq!(cache.rolls(session).await, Some(vec![]));
    }

    #[tokio::test]
    async fn evict_session_keeps_other_sessions() {
        let cache = SessionCache::new();
        let kept = SessionId::new();
        let evicted = SessionId::new();
        cache.put_rolls(kept, vec![roll_at(0)]).await;
        cache.put_rolls(evicted, vec![roll_at(0)]).await;
        cache.put_encounter(evicted, Encounter::seeded(evicted)).await;

        cache.evict_session(evicted).await;

        assert!(cache.rolls(kept).await.is_some());
        assert!(cache.rolls(evicted).await.is_none());
    }
}
