//! Character client: read-model and edit operations over one character sheet
//!
//! Accessors compute derived stats through the [`ComputationResolver`].
//! Mutators never modify the borrowed character; each returns the next
//! version of the sheet, built by merging a [`CharacterUpdate`]. Persisting
//! that value is the caller's job.

use crate::catalog::{Catalog, Class, ClassAbility, Item, Perk, Race};
use crate::computation::{
    active_class_abilities, active_perks, character_class, class_item_bonus, ComputationKey,
    ComputationResolver,
};
use crate::{
    Attribute, AttributeKey, Attributes, Character, CharacterId, CharacterUpdate, DiceFactor,
    DomainError, ItemQuantity, Skill, MAX_ATTRIBUTE_VALUE, MAX_LEVEL, MAX_LEVEL_POINTS,
    MAX_SKILL_VALUE, MIN_ATTRIBUTE_VALUE, MIN_SKILL_VALUE,
};

/// The character's class together with its current item bonus
#[derive(Debug, Clone, Copy)]
pub struct ClassView<'c> {
    pub class: &'c Class,
    pub class_item_bonus: u8,
}

/// One inventory line joined with its catalog entry
#[derive(Debug, Clone, Copy)]
pub struct InventoryLine<'c> {
    pub item: &'c Item,
    pub quantity: u32,
}

impl InventoryLine<'_> {
    pub fn weight(&self) -> u32 {
        self.item.weight.unwrap_or(0).saturating_mul(self.quantity)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CharacterClient<'a> {
    character: &'a Character,
    catalog: &'a Catalog,
}

impl<'a> CharacterClient<'a> {
    pub fn new(character: &'a Character, catalog: &'a Catalog) -> Self {
        Self { character, catalog }
    }

    /// Client backed by the built-in catalog.
    pub fn standard(character: &'a Character) -> Self {
        Self::new(character, Catalog::standard())
    }

    pub fn character(&self) -> &'a Character {
        self.character
    }

    fn resolver(&self) -> ComputationResolver<'a> {
        ComputationResolver::new(self.catalog)
    }

    /// Resolve a derived stat, rounded to the nearest integer.
    pub fn compute(&self, key: ComputationKey) -> Result<i32, DomainError> {
        let value = self.resolver().resolve(self.character, key)?;
        Ok(value.round() as i32)
    }

    fn update(&self, update: CharacterUpdate) -> Character {
        self.character.merge(update)
    }

    // ---------- identity ----------

    pub fn id(&self) -> CharacterId {
        self.character.id
    }

    pub fn name(&self) -> &'a str {
        &self.character.name
    }

    pub fn set_name(&self, name: impl Into<String>) -> Character {
        self.update(CharacterUpdate {
            name: Some(name.into()),
            ..Default::default()
        })
    }

    // ---------- race ----------

    pub fn race(&self) -> Result<Option<&'a Race>, DomainError> {
        self.character
            .race_key
            .as_deref()
            .map(|key| {
                self.catalog
                    .race(key)
                    .ok_or_else(|| DomainError::not_found("Race", key))
            })
            .transpose()
    }

    pub fn set_race(&self, race_key: Option<&str>) -> Result<Character, DomainError> {
        if let Some(key) = race_key {
            if self.catalog.race(key).is_none() {
                return Err(DomainError::not_found("Race", key));
            }
        }
        Ok(self.update(CharacterUpdate {
            race_key: Some(race_key.map(str::to_string)),
            ..Default::default()
        }))
    }

    // ---------- class ----------

    pub fn class(&self) -> Result<Option<ClassView<'a>>, DomainError> {
        let class = character_class(self.character, self.catalog)?;
        Ok(class.map(|class| ClassView {
            class,
            class_item_bonus: class_item_bonus(self.character.level),
        }))
    }

    pub fn class_item_description(&self) -> &'a str {
        &self.character.class_item_description
    }

    pub fn set_class_item_description(&self, description: impl Into<String>) -> Character {
        self.update(CharacterUpdate {
            class_item_description: Some(description.into()),
            ..Default::default()
        })
    }

    /// Switch class in one step: drop the old class skill slot, add the new
    /// one at zero, clear acquired class abilities and the class item text.
    pub fn set_class(&self, class_key: Option<&str>) -> Result<Character, DomainError> {
        let new_class = class_key
            .map(|key| {
                self.catalog
                    .class(key)
                    .ok_or_else(|| DomainError::not_found("Class", key))
            })
            .transpose()?;

        let mut attributes = self.character.attributes.clone();

        if let Some(old_class) = character_class(self.character, self.catalog)? {
            attributes
                .get_mut(old_class.attribute_key)
                .skills
                .remove(&old_class.skill_key);
        }

        if let Some(new_class) = new_class {
            attributes
                .get_mut(new_class.attribute_key)
                .skills
                .insert(new_class.skill_key.clone(), Skill::new(&new_class.skill_key));
        }

        Ok(self.update(CharacterUpdate {
            class_key: Some(class_key.map(str::to_string)),
            class_item_description: Some(String::new()),
            attributes: Some(attributes),
            class_ability_keys: Some(Vec::new()),
            ..Default::default()
        }))
    }

    // ---------- goals ----------

    pub fn party_goal(&self) -> &'a str {
        &self.character.party_goal
    }

    pub fn set_party_goal(&self, goal: impl Into<String>) -> Character {
        self.update(CharacterUpdate {
            party_goal: Some(goal.into()),
            ..Default::default()
        })
    }

    pub fn personal_goal(&self) -> &'a str {
        &self.character.personal_goal
    }

    pub fn set_personal_goal(&self, goal: impl Into<String>) -> Character {
        self.update(CharacterUpdate {
            personal_goal: Some(goal.into()),
            ..Default::default()
        })
    }

    // ---------- level ----------

    pub fn level(&self) -> u8 {
        self.character.level
    }

    /// Gain a level (up to 24), spending all level points.
    pub fn level_up(&self) -> Character {
        if self.character.level >= MAX_LEVEL {
            return self.character.clone();
        }
        self.update(CharacterUpdate {
            level: Some(self.character.level + 1),
            level_points: Some(0),
            ..Default::default()
        })
    }

    pub fn level_points(&self) -> u8 {
        self.character.level_points
    }

    pub fn set_level_points(&self, points: i32) -> Character {
        self.update(CharacterUpdate {
            level_points: Some(clamp_u8(points, 0, MAX_LEVEL_POINTS)),
            ..Default::default()
        })
    }

    // ---------- health and class points ----------

    pub fn max_health_points(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::MaxHealthPoints)
    }

    pub fn health_points(&self) -> u32 {
        self.character.health_points
    }

    /// Clamp to `[0, max health]` against the current sheet.
    pub fn set_health_points(&self, points: i32) -> Result<Character, DomainError> {
        let max = self.max_health_points()?;
        Ok(self.update(CharacterUpdate {
            health_points: Some(clamp_points(points, max)),
            ..Default::default()
        }))
    }

    pub fn max_class_points(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::MaxClassPoints)
    }

    pub fn class_points(&self) -> u32 {
        self.character.class_points
    }

    /// Clamp to `[0, max class points]` against the current sheet.
    pub fn set_class_points(&self, points: i32) -> Result<Character, DomainError> {
        let max = self.max_class_points()?;
        Ok(self.update(CharacterUpdate {
            class_points: Some(clamp_points(points, max)),
            ..Default::default()
        }))
    }

    // ---------- other derived stats ----------

    pub fn speed(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::Speed)
    }

    pub fn carrying_capacity(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::CarryingCapacity)
    }

    pub fn initiative(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::Initiative)
    }

    pub fn looting(&self) -> Result<i32, DomainError> {
        self.compute(ComputationKey::Looting)
    }

    // ---------- progression budgets ----------

    pub fn max_skill_point_count(&self) -> u32 {
        6 + u32::from(self.character.level) - 1
    }

    pub fn max_attribute_point_count(&self) -> u32 {
        12 + u32::from(self.character.level) / 4
    }

    pub fn max_class_ability_count(&self) -> u32 {
        1 + u32::from(self.character.level) / 3
    }

    pub fn max_perk_count(&self) -> u32 {
        1 + u32::from(self.character.level) / 2
    }

    // ---------- attributes and skills ----------

    pub fn attributes(&self) -> &'a Attributes {
        &self.character.attributes
    }

    pub fn attribute(&self, key: AttributeKey) -> &'a Attribute {
        self.character.attributes.get(key)
    }

    /// Clamped to `[1, 6]`. Health and class points are not re-clamped when
    /// a lowered attribute shrinks their maximums; only their setters clamp.
    pub fn set_attribute_value(&self, key: AttributeKey, value: i32) -> Character {
        let mut attributes = self.character.attributes.clone();
        attributes.get_mut(key).value = clamp_u8(value, MIN_ATTRIBUTE_VALUE, MAX_ATTRIBUTE_VALUE);
        self.update(CharacterUpdate {
            attributes: Some(attributes),
            ..Default::default()
        })
    }

    /// Clamped to `[0, 3]`. The skill must exist under the attribute.
    pub fn set_skill_value(
        &self,
        attribute_key: AttributeKey,
        skill_key: &str,
        value: i32,
    ) -> Result<Character, DomainError> {
        let mut attributes = self.character.attributes.clone();
        let skill = attributes
            .get_mut(attribute_key)
            .skills
            .get_mut(skill_key)
            .ok_or_else(|| {
                DomainError::not_found("Skill", format!("{}.{}", attribute_key, skill_key))
            })?;
        skill.value = clamp_u8(value, MIN_SKILL_VALUE, MAX_SKILL_VALUE);
        Ok(self.update(CharacterUpdate {
            attributes: Some(attributes),
            ..Default::default()
        }))
    }

    // ---------- perks ----------

    /// Race perk first, then acquired perks in order.
    pub fn perks(&self) -> Result<Vec<&'a Perk>, DomainError> {
        Ok(active_perks(self.character, self.catalog)?)
    }

    /// Whether the character meets a perk's skill requirement. Perks without
    /// a requirement are always available.
    pub fn perk_requirement_met(&self, perk_key: &str) -> Result<bool, DomainError> {
        let perk = self
            .catalog
            .perk(perk_key)
            .ok_or_else(|| DomainError::not_found("Perk", perk_key))?;
        Ok(perk
            .requirement
            .as_ref()
            .map(|requirement| requirement.is_met_by(self.character))
            .unwrap_or(true))
    }

    /// Append a perk. Already-acquired perks are left as is.
    pub fn add_perk(&self, perk_key: &str) -> Result<Character, DomainError> {
        if self.catalog.perk(perk_key).is_none() {
            return Err(DomainError::not_found("Perk", perk_key));
        }
        if self.character.perk_keys.iter().any(|key| key == perk_key) {
            return Ok(self.character.clone());
        }
        let mut keys = self.character.perk_keys.clone();
        keys.push(perk_key.to_string());
        Ok(self.update(CharacterUpdate {
            perk_keys: Some(keys),
            ..Default::default()
        }))
    }

    pub fn remove_perk(&self, perk_key: &str) -> Character {
        self.update(CharacterUpdate {
            perk_keys: Some(without(&self.character.perk_keys, perk_key)),
            ..Default::default()
        })
    }

    // ---------- class abilities ----------

    /// Innate, acquired and implied abilities in catalog order.
    pub fn class_abilities(&self) -> Result<Vec<&'a ClassAbility>, DomainError> {
        Ok(active_class_abilities(self.character, self.catalog)?)
    }

    /// Acquire an ability of the current class.
    pub fn add_class_ability(&self, ability_key: &str) -> Result<Character, DomainError> {
        let class = character_class(self.character, self.catalog)?
            .ok_or_else(|| DomainError::constraint("Character has no class"))?;
        if class.ability(ability_key).is_none() {
            return Err(DomainError::not_found("ClassAbility", ability_key));
        }
        if self.character.class_ability_keys.iter().any(|key| key == ability_key) {
            return Ok(self.character.clone());
        }
        let mut keys = self.character.class_ability_keys.clone();
        keys.push(ability_key.to_string());
        Ok(self.update(CharacterUpdate {
            class_ability_keys: Some(keys),
            ..Default::default()
        }))
    }

    pub fn remove_class_ability(&self, ability_key: &str) -> Character {
        self.update(CharacterUpdate {
            class_ability_keys: Some(without(&self.character.class_ability_keys, ability_key)),
            ..Default::default()
        })
    }

    // ---------- inventory ----------

    pub fn items(&self) -> Result<Vec<InventoryLine<'a>>, DomainError> {
        self.character
            .item_quantities
            .iter()
            .map(|line| {
                self.catalog
                    .item(&line.key)
                    .map(|item| InventoryLine {
                        item,
                        quantity: line.quantity,
                    })
                    .ok_or_else(|| DomainError::not_found("Item", line.key.as_str()))
            })
            .collect()
    }

    /// Total weight of everything carried.
    pub fn item_weight(&self) -> Result<u32, DomainError> {
        Ok(self.items()?.iter().map(InventoryLine::weight).sum())
    }

    pub fn is_over_capacity(&self) -> Result<bool, DomainError> {
        let weight = i64::from(self.item_weight()?);
        Ok(weight > i64::from(self.carrying_capacity()?))
    }

    /// Add one of an item. An item already in the inventory is left as is.
    pub fn add_item(&self, item_key: &str) -> Result<Character, DomainError> {
        if self.catalog.item(item_key).is_none() {
            return Err(DomainError::not_found("Item", item_key));
        }
        if self.character.item_quantity(item_key).is_some() {
            return Ok(self.character.clone());
        }
        let mut lines = self.character.item_quantities.clone();
        lines.push(ItemQuantity::new(item_key, 1));
        Ok(self.update(CharacterUpdate {
            item_quantities: Some(lines),
            ..Default::default()
        }))
    }

    /// Drop an inventory line. Untyped lines (currency) are kept.
    pub fn remove_item(&self, item_key: &str) -> Character {
        if self
            .catalog
            .item(item_key)
            .is_some_and(|item| !item.is_removable())
        {
            return self.character.clone();
        }
        let lines = self
            .character
            .item_quantities
            .iter()
            .filter(|line| line.key != item_key)
            .cloned()
            .collect();
        self.update(CharacterUpdate {
            item_quantities: Some(lines),
            ..Default::default()
        })
    }

    /// Set a carried item's quantity. Zero removes typed items; currency stays
    /// at zero. Items not in the inventory are ignored.
    pub fn set_item_quantity(&self, item_key: &str, quantity: u32) -> Result<Character, DomainError> {
        if self.character.item_quantity(item_key).is_none() {
            return Ok(self.character.clone());
        }
        let item = self
            .catalog
            .item(item_key)
            .ok_or_else(|| DomainError::not_found("Item", item_key))?;

        if quantity == 0 && item.is_removable() {
            return Ok(self.remove_item(item_key));
        }

        let lines = self
            .character
            .item_quantities
            .iter()
            .map(|line| {
                if line.key == item_key {
                    ItemQuantity::new(item_key, quantity)
                } else {
                    line.clone()
                }
            })
            .collect();
        Ok(self.update(CharacterUpdate {
            item_quantities: Some(lines),
            ..Default::default()
        }))
    }

    // ---------- survival ----------

    pub fn satiation(&self) -> u32 {
        self.character.satiation
    }

    pub fn set_satiation(&self, satiation: u32) -> Character {
        self.update(CharacterUpdate {
            satiation: Some(satiation),
            ..Default::default()
        })
    }

    pub fn exhaustion(&self) -> u32 {
        self.character.exhaustion
    }

    pub fn set_exhaustion(&self, exhaustion: u32) -> Character {
        self.update(CharacterUpdate {
            exhaustion: Some(exhaustion),
            ..Default::default()
        })
    }

    // ---------- dice pools ----------

    fn skill_factors(
        &self,
        attribute_key: AttributeKey,
        skill_key: &str,
    ) -> Result<Vec<DiceFactor>, DomainError> {
        let attribute = self.attribute(attribute_key);
        let skill = attribute.skill(skill_key).ok_or_else(|| {
            DomainError::not_found("Skill", format!("{}.{}", attribute_key, skill_key))
        })?;
        Ok(vec![
            DiceFactor::new(attribute.label.clone(), i32::from(attribute.value)),
            DiceFactor::new(skill.label.clone(), i32::from(skill.value)),
        ])
    }

    /// Dice factors for a skill check: attribute, skill, minus exhaustion.
    pub fn skill_check_factors(
        &self,
        attribute_key: AttributeKey,
        skill_key: &str,
    ) -> Result<Vec<DiceFactor>, DomainError> {
        let mut factors = self.skill_factors(attribute_key, skill_key)?;
        self.push_exhaustion(&mut factors);
        Ok(factors)
    }

    /// Dice factors for using an item's skill bonus.
    pub fn item_check_factors(&self, item_key: &str) -> Result<Vec<DiceFactor>, DomainError> {
        let item = self
            .catalog
            .item(item_key)
            .ok_or_else(|| DomainError::not_found("Item", item_key))?;
        let bonus = item
            .bonus
            .as_ref()
            .ok_or_else(|| DomainError::validation(format!("{} has no skill bonus", item.name)))?;

        let mut factors = self.skill_factors(bonus.attribute_key, &bonus.skill_key)?;
        factors.push(DiceFactor::new(item.name.clone(), bonus.skill_bonus));
        self.push_exhaustion(&mut factors);
        Ok(factors)
    }

    /// Dice factors for an item's damage roll.
    pub fn item_damage_factors(&self, item_key: &str) -> Result<Vec<DiceFactor>, DomainError> {
        let item = self
            .catalog
            .item(item_key)
            .ok_or_else(|| DomainError::not_found("Item", item_key))?;
        let damage = item
            .damage
            .ok_or_else(|| DomainError::validation(format!("{} deals no damage", item.name)))?;
        Ok(vec![DiceFactor::new(
            "Damage",
            i32::try_from(damage).unwrap_or(i32::MAX),
        )])
    }

    fn push_exhaustion(&self, factors: &mut Vec<DiceFactor>) {
        if self.character.exhaustion > 0 {
            let value = i32::try_from(self.character.exhaustion).unwrap_or(i32::MAX);
            factors.push(DiceFactor::new(EXHAUSTION_LABEL, -value));
        }
    }
}

const EXHAUSTION_LABEL: &str = "Exhaustion";

fn clamp_u8(value: i32, min: u8, max: u8) -> u8 {
    let clamped = value.clamp(i32::from(min), i32::from(max));
    u8::try_from(clamped).unwrap_or(min)
}

fn clamp_points(value: i32, max: i32) -> u32 {
    u32::try_from(value.clamp(0, max.max(0))).unwrap_or(0)
}

fn without(keys: &[String], key: &str) -> Vec<String> {
    keys.iter().filter(|k| *k != key).cloned().collect()
}
