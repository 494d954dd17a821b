//! Character sheet entity
//!
//! A character owns five attributes, each holding three base skills. A class
//! grants one extra skill slot under one attribute; that slot is added and
//! removed by the character client when the class changes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CharacterId, DomainError, UserId};

pub const MIN_ATTRIBUTE_VALUE: u8 = 1;
pub const MAX_ATTRIBUTE_VALUE: u8 = 6;
pub const MIN_SKILL_VALUE: u8 = 0;
pub const MAX_SKILL_VALUE: u8 = 3;
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 24;
pub const MAX_LEVEL_POINTS: u8 = 6;
pub const DEFAULT_HEALTH_POINTS: u32 = 12;

/// Item key of the currency line every character starts with
pub const CURRENCY_ITEM_KEY: &str = "currency";

/// The five attribute categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKey {
    Strength,
    Dexterity,
    Intelligence,
    Charisma,
    Perception,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 5] = [
        AttributeKey::Strength,
        AttributeKey::Dexterity,
        AttributeKey::Intelligence,
        AttributeKey::Charisma,
        AttributeKey::Perception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Intelligence => "intelligence",
            Self::Charisma => "charisma",
            Self::Perception => "perception",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Dexterity => "Dexterity",
            Self::Intelligence => "Intelligence",
            Self::Charisma => "Charisma",
            Self::Perception => "Perception",
        }
    }

    /// The three skills every character has under this attribute.
    pub fn base_skill_keys(&self) -> [&'static str; 3] {
        match self {
            Self::Strength => ["power", "fortitude", "athletics"],
            Self::Dexterity => ["precision", "stealth", "agility"],
            Self::Intelligence => ["intellect", "medicine", "engineering"],
            Self::Charisma => ["intuition", "influence", "luck"],
            Self::Perception => ["insight", "detection", "investigation"],
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "dexterity" => Ok(Self::Dexterity),
            "intelligence" => Ok(Self::Intelligence),
            "charisma" => Ok(Self::Charisma),
            "perception" => Ok(Self::Perception),
            _ => Err(DomainError::validation(format!("Unknown attribute: {}", s))),
        }
    }
}

/// Capitalize the first letter of a key for display (`"fortitude"` -> `"Fortitude"`).
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub label: String,
    pub value: u8,
}

impl Skill {
    pub fn new(key: &str) -> Self {
        Self {
            label: capitalize(key),
            value: MIN_SKILL_VALUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub label: String,
    pub value: u8,
    pub skills: BTreeMap<String, Skill>,
}

impl Attribute {
    /// Attribute at its minimum value with its three base skills at zero.
    pub fn new(key: AttributeKey) -> Self {
        Self {
            label: key.label().to_string(),
            value: MIN_ATTRIBUTE_VALUE,
            skills: key
                .base_skill_keys()
                .iter()
                .map(|skill_key| (skill_key.to_string(), Skill::new(skill_key)))
                .collect(),
        }
    }

    pub fn skill(&self, key: &str) -> Option<&Skill> {
        self.skills.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: Attribute,
    pub dexterity: Attribute,
    pub intelligence: Attribute,
    pub charisma: Attribute,
    pub perception: Attribute,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: Attribute::new(AttributeKey::Strength),
            dexterity: Attribute::new(AttributeKey::Dexterity),
            intelligence: Attribute::new(AttributeKey::Intelligence),
            charisma: Attribute::new(AttributeKey::Charisma),
            perception: Attribute::new(AttributeKey::Perception),
        }
    }
}

impl Attributes {
    pub fn get(&self, key: AttributeKey) -> &Attribute {
        match key {
            AttributeKey::Strength => &self.strength,
            AttributeKey::Dexterity => &self.dexterity,
            AttributeKey::Intelligence => &self.intelligence,
            AttributeKey::Charisma => &self.charisma,
            AttributeKey::Perception => &self.perception,
        }
    }

    pub fn get_mut(&mut self, key: AttributeKey) -> &mut Attribute {
        match key {
            AttributeKey::Strength => &mut self.strength,
            AttributeKey::Dexterity => &mut self.dexterity,
            AttributeKey::Intelligence => &mut self.intelligence,
            AttributeKey::Charisma => &mut self.charisma,
            AttributeKey::Perception => &mut self.perception,
        }
    }

    /// Attributes in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, &Attribute)> {
        AttributeKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// Look up a skill under a specific attribute.
    pub fn skill(&self, attribute: AttributeKey, skill_key: &str) -> Option<&Skill> {
        self.get(attribute).skill(skill_key)
    }
}

/// One inventory line: catalog item key and how many are carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub key: String,
    pub quantity: u32,
}

impl ItemQuantity {
    pub fn new(key: impl Into<String>, quantity: u32) -> Self {
        Self {
            key: key.into(),
            quantity,
        }
    }
}

/// A player's character sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub race_key: Option<String>,
    #[serde(default)]
    pub class_key: Option<String>,
    #[serde(default)]
    pub class_item_description: String,
    #[serde(default)]
    pub party_goal: String,
    #[serde(default)]
    pub personal_goal: String,
    pub level: u8,
    pub level_points: u8,
    pub health_points: u32,
    pub class_points: u32,
    pub attributes: Attributes,
    #[serde(default)]
    pub perk_keys: Vec<String>,
    #[serde(default)]
    pub class_ability_keys: Vec<String>,
    #[serde(default)]
    pub item_quantities: Vec<ItemQuantity>,
    #[serde(default)]
    pub satiation: u32,
    #[serde(default)]
    pub exhaustion: u32,
}

impl Character {
    /// A fresh level 1 character owned by `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CharacterId::new(),
            user_id,
            name: String::new(),
            race_key: None,
            class_key: None,
            class_item_description: String::new(),
            party_goal: String::new(),
            personal_goal: String::new(),
            level: MIN_LEVEL,
            level_points: 0,
            health_points: DEFAULT_HEALTH_POINTS,
            class_points: 0,
            attributes: Attributes::default(),
            perk_keys: Vec::new(),
            class_ability_keys: Vec::new(),
            item_quantities: vec![ItemQuantity::new(CURRENCY_ITEM_KEY, 0)],
            satiation: 0,
            exhaustion: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Check ownership, returning `NotOwner` for anyone else.
    pub fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(DomainError::not_owner("Character", self.id.to_string()))
        }
    }

    /// Check the sheet's stored values against their bounds: level, level
    /// points, attribute values and skill values.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(DomainError::validation(format!(
                "Level must be between {MIN_LEVEL} and {MAX_LEVEL}"
            )));
        }
        if self.level_points > MAX_LEVEL_POINTS {
            return Err(DomainError::validation(format!(
                "Level points must be at most {MAX_LEVEL_POINTS}"
            )));
        }
        for (key, attribute) in self.attributes.iter() {
            if !(MIN_ATTRIBUTE_VALUE..=MAX_ATTRIBUTE_VALUE).contains(&attribute.value) {
                return Err(DomainError::validation(format!(
                    "Attribute {key} must be between {MIN_ATTRIBUTE_VALUE} and {MAX_ATTRIBUTE_VALUE}"
                )));
            }
            if let Some((skill_key, _)) = attribute
                .skills
                .iter()
                .find(|(_, skill)| !(MIN_SKILL_VALUE..=MAX_SKILL_VALUE).contains(&skill.value))
            {
                return Err(DomainError::validation(format!(
                    "Skill {key}.{skill_key} must be between {MIN_SKILL_VALUE} and {MAX_SKILL_VALUE}"
                )));
            }
        }
        Ok(())
    }

    pub fn item_quantity(&self, key: &str) -> Option<u32> {
        self.item_quantities
            .iter()
            .find(|line| line.key == key)
            .map(|line| line.quantity)
    }

    /// Apply a partial update, producing a new character.
    pub fn merge(&self, update: CharacterUpdate) -> Character {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(race_key) = update.race_key {
            next.race_key = race_key;
        }
        if let Some(class_key) = update.class_key {
            next.class_key = class_key;
        }
        if let Some(description) = update.class_item_description {
            next.class_item_description = description;
        }
        if let Some(goal) = update.party_goal {
            next.party_goal = goal;
        }
        if let Some(goal) = update.personal_goal {
            next.personal_goal = goal;
        }
        if let Some(level) = update.level {
            next.level = level;
        }
        if let Some(points) = update.level_points {
            next.level_points = points;
        }
        if let Some(points) = update.health_points {
            next.health_points = points;
        }
        if let Some(points) = update.class_points {
            next.class_points = points;
        }
        if let Some(attributes) = update.attributes {
            next.attributes = attributes;
        }
        if let Some(keys) = update.perk_keys {
            next.perk_keys = keys;
        }
        if let Some(keys) = update.class_ability_keys {
            next.class_ability_keys = keys;
        }
        if let Some(items) = update.item_quantities {
            next.item_quantities = items;
        }
        if let Some(satiation) = update.satiation {
            next.satiation = satiation;
        }
        if let Some(exhaustion) = update.exhaustion {
            next.exhaustion = exhaustion;
        }
        next
    }
}

/// Partial character update; `None` leaves a field untouched.
///
/// Optional keys use a nested `Option` so that `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub race_key: Option<Option<String>>,
    pub class_key: Option<Option<String>>,
    pub class_item_description: Option<String>,
    pub party_goal: Option<String>,
    pub personal_goal: Option<String>,
    pub level: Option<u8>,
    pub level_points: Option<u8>,
    pub health_points: Option<u32>,
    pub class_points: Option<u32>,
    pub attributes: Option<Attributes>,
    pub perk_keys: Option<Vec<String>>,
    pub class_ability_keys: Option<Vec<String>>,
    pub item_quantities: Option<Vec<ItemQuantity>>,
    pub satiation: Option<u32>,
    pub exhaustion: Option<u32>,
}
