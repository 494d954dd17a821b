//! Character service: load, edit through the character facade, persist, and
//! roll dice pools built from the sheet.

use std::sync::Arc;

use rand::Rng;

use vademecum_domain::{
    AttributeKey, Catalog, Character, CharacterClient, CharacterId, DiceFactor, DomainError, Roll,
    RollEvaluation, SessionId, DIE_SIDES,
};

use crate::application::services::SessionService;
use crate::application::ServiceError;
use crate::infrastructure::cache::SessionCache;
use crate::ports::outbound::StorePort;

pub struct CharacterService {
    store: Arc<dyn StorePort>,
    cache: Arc<SessionCache>,
    catalog: &'static Catalog,
}

impl CharacterService {
    pub fn new(store: Arc<dyn StorePort>, cache: Arc<SessionCache>) -> Self {
        Self {
            store,
            cache,
            catalog: Catalog::standard(),
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub async fn create(&self) -> Result<Character, ServiceError> {
        let character = self.store.create_character().await?;
        tracing::info!(character_id = %character.id, "Created character");
        Ok(character)
    }

    /// Load a character, from cache when present.
    pub async fn load(&self, character_id: CharacterId) -> Result<Character, ServiceError> {
        if let Some(character) = self.cache.character(character_id).await {
            return Ok(character);
        }
        let character = self.store.get_character(character_id).await?;
        self.cache.put_character(character.clone()).await;
        Ok(character)
    }

    pub async fn delete(&self, character_id: CharacterId) -> Result<(), ServiceError> {
        Ok(self.store.delete_character(character_id).await?)
    }

    /// Apply one facade mutation and persist the result.
    ///
    /// The persisted sheet replaces the cached copy right away, so a following
    /// edit builds on it whether or not a `CHARACTER_UPDATED` push arrives.
    pub async fn edit<F>(&self, character_id: CharacterId, mutate: F) -> Result<Character, ServiceError>
    where
        F: for<'a> FnOnce(&CharacterClient<'a>) -> Result<Character, DomainError>,
    {
        let current = self.load(character_id).await?;
        let updated = mutate(&CharacterClient::new(&current, self.catalog))?;
        if updated == current {
            return Ok(current);
        }
        let persisted = self.store.update_character(&updated).await?;
        self.cache.upsert_character(&persisted).await;
        Ok(persisted)
    }

    /// Roll a skill check and post it to the session log.
    pub async fn roll_skill(
        &self,
        sessions: &SessionService,
        session_id: SessionId,
        character_id: CharacterId,
        attribute_key: AttributeKey,
        skill_key: &str,
    ) -> Result<Roll, ServiceError> {
        let character = self.load(character_id).await?;
        let client = CharacterClient::new(&character, self.catalog);
        let factors = client.skill_check_factors(attribute_key, skill_key)?;
        let label = client
            .attribute(attribute_key)
            .skill(skill_key)
            .map(|skill| skill.label.clone())
            .unwrap_or_else(|| skill_key.to_string());

        let roll = roll_pool(character_id, label, &factors, RollEvaluation::Check);
        sessions.post_roll(session_id, &roll).await
    }

    /// Roll a check using an item's skill bonus.
    pub async fn roll_item_check(
        &self,
        sessions: &SessionService,
        session_id: SessionId,
        character_id: CharacterId,
        item_key: &str,
    ) -> Result<Roll, ServiceError> {
        let character = self.load(character_id).await?;
        let client = CharacterClient::new(&character, self.catalog);
        let factors = client.item_check_factors(item_key)?;
        let label = item_label(self.catalog, item_key);

        let roll = roll_pool(character_id, label, &factors, RollEvaluation::Check);
        sessions.post_roll(session_id, &roll).await
    }

    /// Roll an item's damage, summed.
    pub async fn roll_item_damage(
        &self,
        sessions: &SessionService,
        session_id: SessionId,
        character_id: CharacterId,
        item_key: &str,
    ) -> Result<Roll, ServiceError> {
        let character = self.load(character_id).await?;
        let client = CharacterClient::new(&character, self.catalog);
        let factors = client.item_damage_factors(item_key)?;
        let label = format!("{} damage", item_label(self.catalog, item_key));

        let roll = roll_pool(character_id, label, &factors, RollEvaluation::Sum);
        sessions.post_roll(session_id, &roll).await
    }
}

fn item_label(catalog: &Catalog, item_key: &str) -> String {
    catalog
        .item(item_key)
        .map(|item| item.name.clone())
        .unwrap_or_else(|| item_key.to_string())
}

fn roll_pool(
    character_id: CharacterId,
    label: String,
    factors: &[DiceFactor],
    evaluation: RollEvaluation,
) -> Roll {
    let mut rng = rand::thread_rng();
    Roll::roll(
        character_id,
        label,
        factors,
        evaluation,
        chrono::Utc::now(),
        || rng.gen_range(1..=DIE_SIDES),
    )
}
