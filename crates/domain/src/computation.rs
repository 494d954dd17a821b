//! Computation resolver for derived character stats
//!
//! A derived stat starts from a base formula (the class's, else the standard
//! default) and may be replaced by the first perk, then the first active class
//! ability, that declares an override for the same key. Overrides see the base
//! value as `[base]`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Class, ClassAbility, Perk};
use crate::formula::{Formula, FormulaError, Namespace};
use crate::Character;

/// Variable holding the evaluated base formula
pub const BASE_VARIABLE: &str = "base";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputationError {
    #[error(transparent)]
    Formula(#[from] FormulaError),
    /// The character references a catalog key that does not exist
    #[error("Unknown {kind}: {key}")]
    UnknownCatalogEntry { kind: &'static str, key: String },
}

impl ComputationError {
    pub fn unknown_entry(kind: &'static str, key: impl Into<String>) -> Self {
        Self::UnknownCatalogEntry {
            kind,
            key: key.into(),
        }
    }
}

/// Derived stats subject to tiered overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComputationKey {
    MaxHealthPoints,
    Speed,
    MaxClassPoints,
    CarryingCapacity,
    Initiative,
    Looting,
}

impl ComputationKey {
    pub const ALL: [ComputationKey; 6] = [
        ComputationKey::MaxHealthPoints,
        ComputationKey::Speed,
        ComputationKey::MaxClassPoints,
        ComputationKey::CarryingCapacity,
        ComputationKey::Initiative,
        ComputationKey::Looting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxHealthPoints => "maxHealthPoints",
            Self::Speed => "speed",
            Self::MaxClassPoints => "maxClassPoints",
            Self::CarryingCapacity => "carryingCapacity",
            Self::Initiative => "initiative",
            Self::Looting => "looting",
        }
    }

    /// Standard formula used when the class declares none.
    pub fn default_formula(&self) -> Option<&'static str> {
        match self {
            Self::MaxHealthPoints => Some("([level] + [attribute.strength] + [skill.fortitude]) * 6"),
            Self::Speed => Some("3 + [attribute.dexterity] + [skill.agility]"),
            Self::MaxClassPoints => None,
            Self::CarryingCapacity => Some("([attribute.strength] + [skill.fortitude]) * 3"),
            Self::Initiative => Some(
                "[attribute.dexterity] + [skill.agility] + [attribute.perception] + [skill.detection]",
            ),
            Self::Looting => Some("[level] + [skill.luck]"),
        }
    }
}

impl fmt::Display for ComputationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stat formula overrides declared by a class, perk or class ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health_points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_class_points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrying_capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looting: Option<String>,
}

impl ComputedOverrides {
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: ComputationKey, formula: impl Into<String>) -> Self {
        *self.slot_mut(key) = Some(formula.into());
        self
    }

    pub fn get(&self, key: ComputationKey) -> Option<&str> {
        match key {
            ComputationKey::MaxHealthPoints => self.max_health_points.as_deref(),
            ComputationKey::Speed => self.speed.as_deref(),
            ComputationKey::MaxClassPoints => self.max_class_points.as_deref(),
            ComputationKey::CarryingCapacity => self.carrying_capacity.as_deref(),
            ComputationKey::Initiative => self.initiative.as_deref(),
            ComputationKey::Looting => self.looting.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ComputationKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    /// Declared overrides in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ComputationKey, &str)> {
        ComputationKey::ALL
            .into_iter()
            .filter_map(move |key| self.get(key).map(|formula| (key, formula)))
    }

    fn slot_mut(&mut self, key: ComputationKey) -> &mut Option<String> {
        match key {
            ComputationKey::MaxHealthPoints => &mut self.max_health_points,
            ComputationKey::Speed => &mut self.speed,
            ComputationKey::MaxClassPoints => &mut self.max_class_points,
            ComputationKey::CarryingCapacity => &mut self.carrying_capacity,
            ComputationKey::Initiative => &mut self.initiative,
            ComputationKey::Looting => &mut self.looting,
        }
    }
}

/// `floor(level / 6)`
pub fn class_item_bonus(level: u8) -> u8 {
    level / 6
}

/// Variables visible to every formula: level, class item bonus, every
/// attribute and skill value.
pub fn build_namespace(character: &Character) -> Namespace {
    let mut namespace = Namespace::new()
        .with("level", f64::from(character.level))
        .with("classItemBonus", f64::from(class_item_bonus(character.level)));

    for (key, attribute) in character.attributes.iter() {
        namespace.insert(format!("attribute.{}", key), f64::from(attribute.value));
        for (skill_key, skill) in &attribute.skills {
            namespace.insert(format!("skill.{}", skill_key), f64::from(skill.value));
        }
    }

    namespace
}

/// The character's class, if any.
pub fn character_class<'c>(
    character: &Character,
    catalog: &'c Catalog,
) -> Result<Option<&'c Class>, ComputationError> {
    character
        .class_key
        .as_deref()
        .map(|key| {
            catalog
                .class(key)
                .ok_or_else(|| ComputationError::unknown_entry("class", key))
        })
        .transpose()
}

/// Active perks: the race perk first (if any), then acquired perks in order.
pub fn active_perks<'c>(
    character: &Character,
    catalog: &'c Catalog,
) -> Result<Vec<&'c Perk>, ComputationError> {
    let mut perks = Vec::with_capacity(character.perk_keys.len() + 1);

    if let Some(race_key) = character.race_key.as_deref() {
        let race = catalog
            .race(race_key)
            .ok_or_else(|| ComputationError::unknown_entry("race", race_key))?;
        perks.push(&race.perk);
    }

    for key in &character.perk_keys {
        let perk = catalog
            .perk(key)
            .ok_or_else(|| ComputationError::unknown_entry("perk", key.as_str()))?;
        perks.push(perk);
    }

    Ok(perks)
}

/// Active class abilities in catalog order.
///
/// An ability is active when it is innate, acquired, or implied by an active
/// acquired ability. Implication is followed transitively through the class's
/// unlocks graph. Acquired keys the class does not know are ignored.
pub fn active_class_abilities<'c>(
    character: &Character,
    catalog: &'c Catalog,
) -> Result<Vec<&'c ClassAbility>, ComputationError> {
    let Some(class) = character_class(character, catalog)? else {
        return Ok(Vec::new());
    };

    let mut reached: HashSet<&str> = character
        .class_ability_keys
        .iter()
        .map(String::as_str)
        .filter(|key| class.ability(key).is_some())
        .collect();

    let mut frontier: Vec<&str> = reached.iter().copied().collect();
    while let Some(key) = frontier.pop() {
        for unlocked in class.unlocked_by(key) {
            if reached.insert(unlocked.key.as_str()) {
                frontier.push(unlocked.key.as_str());
            }
        }
    }

    Ok(class
        .class_abilities
        .iter()
        .filter(|ability| ability.requirement.is_innate() || reached.contains(ability.key.as_str()))
        .collect())
}

/// Resolves derived stats against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct ComputationResolver<'c> {
    catalog: &'c Catalog,
}

impl<'c> ComputationResolver<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Resolve a stat using its standard default formula.
    pub fn resolve(&self, character: &Character, key: ComputationKey) -> Result<f64, ComputationError> {
        self.resolve_with_default(character, key, key.default_formula())
    }

    /// Resolve a stat with a caller-supplied default formula.
    pub fn resolve_with_default(
        &self,
        character: &Character,
        key: ComputationKey,
        default_formula: Option<&str>,
    ) -> Result<f64, ComputationError> {
        let mut namespace = build_namespace(character);

        let class = character_class(character, self.catalog)?;
        let base_formula = class
            .and_then(|class| class.computed.get(key))
            .or(default_formula);

        let Some(base_formula) = base_formula else {
            return Ok(0.0);
        };

        let base_value = Formula::parse(base_formula)?.evaluate(&namespace)?;
        namespace.insert(BASE_VARIABLE, base_value);

        let perks = active_perks(character, self.catalog)?;
        if let Some(formula) = perks.iter().find_map(|perk| perk.computed.get(key)) {
            return Ok(Formula::parse(formula)?.evaluate(&namespace)?);
        }

        let abilities = active_class_abilities(character, self.catalog)?;
        if let Some(formula) = abilities.iter().find_map(|ability| ability.computed.get(key)) {
            return Ok(Formula::parse(formula)?.evaluate(&namespace)?);
        }

        Ok(base_value)
    }
}
