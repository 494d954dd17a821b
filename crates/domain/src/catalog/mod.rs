//! Static rule catalog: perks, races, classes with their abilities, and items
//!
//! The standard catalog is built once and shared (`Catalog::standard()`).
//! Tests and alternate rule sets build their own with `Catalog::new`.

mod classes;
mod items;
mod perks;
mod races;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::computation::ComputedOverrides;
use crate::{AttributeKey, Character};

/// Minimum skill value needed to acquire a perk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerkRequirement {
    pub attribute_key: AttributeKey,
    pub skill_key: String,
    pub skill_requirement: u8,
}

impl PerkRequirement {
    pub fn new(attribute_key: AttributeKey, skill_key: impl Into<String>, skill_requirement: u8) -> Self {
        Self {
            attribute_key,
            skill_key: skill_key.into(),
            skill_requirement,
        }
    }

    /// A missing skill counts as zero.
    pub fn is_met_by(&self, character: &Character) -> bool {
        let value = character
            .attributes
            .skill(self.attribute_key, &self.skill_key)
            .map(|skill| skill.value)
            .unwrap_or(0);
        value >= self.skill_requirement
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perk {
    pub key: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<PerkRequirement>,
    #[serde(default, skip_serializing_if = "ComputedOverrides::is_empty")]
    pub computed: ComputedOverrides,
}

impl Perk {
    pub fn new(key: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            requirement: None,
            computed: ComputedOverrides::none(),
        }
    }

    pub fn with_requirement(mut self, requirement: PerkRequirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    pub fn with_computed(mut self, computed: ComputedOverrides) -> Self {
        self.computed = computed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub key: String,
    pub name: String,
    pub description: String,
    /// Always active for members of the race, ahead of acquired perks
    pub perk: Perk,
}

impl Race {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        perk: Perk,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            perk,
        }
    }
}

/// How a class ability becomes active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbilityRequirement {
    /// Every member of the class has it
    Innate,
    /// Must be acquired by key
    ByKey,
    /// Active whenever the named ability is active
    ImpliedBy(String),
}

impl AbilityRequirement {
    pub fn implied_by(key: impl Into<String>) -> Self {
        Self::ImpliedBy(key.into())
    }

    pub fn is_innate(&self) -> bool {
        matches!(self, Self::Innate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAbility {
    pub key: String,
    pub name: String,
    pub description: String,
    pub requirement: AbilityRequirement,
    #[serde(default, skip_serializing_if = "ComputedOverrides::is_empty")]
    pub computed: ComputedOverrides,
}

impl ClassAbility {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        requirement: AbilityRequirement,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            requirement,
            computed: ComputedOverrides::none(),
        }
    }

    pub fn with_computed(mut self, computed: ComputedOverrides) -> Self {
        self.computed = computed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub key: String,
    pub name: String,
    pub description: String,
    /// Attribute receiving the class skill slot
    pub attribute_key: AttributeKey,
    /// Skill slot granted while the class is held
    pub skill_key: String,
    #[serde(default, skip_serializing_if = "ComputedOverrides::is_empty")]
    pub computed: ComputedOverrides,
    pub class_abilities: Vec<ClassAbility>,
}

impl Class {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        attribute_key: AttributeKey,
        skill_key: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            attribute_key,
            skill_key: skill_key.into(),
            computed: ComputedOverrides::none(),
            class_abilities: Vec::new(),
        }
    }

    pub fn with_computed(mut self, computed: ComputedOverrides) -> Self {
        self.computed = computed;
        self
    }

    pub fn with_abilities(mut self, abilities: Vec<ClassAbility>) -> Self {
        self.class_abilities = abilities;
        self
    }

    pub fn ability(&self, key: &str) -> Option<&ClassAbility> {
        self.class_abilities.iter().find(|ability| ability.key == key)
    }

    /// Abilities directly implied by `key` (outgoing edges of the unlocks graph).
    pub fn unlocked_by<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ClassAbility> + 'a {
        self.class_abilities.iter().filter(move |ability| {
            matches!(&ability.requirement, AbilityRequirement::ImpliedBy(parent) if parent == key)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Weapon,
    Armor,
    Tool,
    Consumable,
    Trinket,
}

/// Skill bonus an item adds to a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBonus {
    pub attribute_key: AttributeKey,
    pub skill_key: String,
    pub skill_bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Untyped items (currency) are never dropped from the inventory
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<ItemBonus>,
    /// Damage dice pool size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
}

impl Item {
    pub fn new(key: impl Into<String>, name: impl Into<String>, item_type: Option<ItemType>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            item_type,
            weight: None,
            bonus: None,
            damage: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_bonus(mut self, attribute_key: AttributeKey, skill_key: impl Into<String>, skill_bonus: i32) -> Self {
        self.bonus = Some(ItemBonus {
            attribute_key,
            skill_key: skill_key.into(),
            skill_bonus,
        });
        self
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn is_removable(&self) -> bool {
        self.item_type.is_some()
    }
}

/// Lookup tables for every rule entry a character can reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    perks: Vec<Perk>,
    races: Vec<Race>,
    classes: Vec<Class>,
    items: Vec<Item>,
}

static STANDARD: Lazy<Catalog> = Lazy::new(|| {
    Catalog::new(
        perks::standard_perks(),
        races::standard_races(),
        classes::standard_classes(),
        items::standard_items(),
    )
});

impl Catalog {
    pub fn new(perks: Vec<Perk>, races: Vec<Race>, classes: Vec<Class>, items: Vec<Item>) -> Self {
        Self {
            perks,
            races,
            classes,
            items,
        }
    }

    /// The built-in rule set.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn perk(&self, key: &str) -> Option<&Perk> {
        self.perks.iter().find(|perk| perk.key == key)
    }

    pub fn race(&self, key: &str) -> Option<&Race> {
        self.races.iter().find(|race| race.key == key)
    }

    pub fn class(&self, key: &str) -> Option<&Class> {
        self.classes.iter().find(|class| class.key == key)
    }

    pub fn item(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn perks(&self) -> &[Perk] {
        &self.perks
    }

    pub fn races(&self) -> &[Race] {
        &self.races
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Every formula declared anywhere in the catalog, labelled by owner key.
    pub fn formulas(&self) -> Vec<(&str, &str)> {
        let perks = self
            .perks
            .iter()
            .chain(self.races.iter().map(|race| &race.perk))
            .flat_map(|perk| perk.computed.iter().map(move |(_, f)| (perk.key.as_str(), f)));
        let classes = self.classes.iter().flat_map(|class| {
            class
                .computed
                .iter()
                .map(move |(_, f)| (class.key.as_str(), f))
                .chain(class.class_abilities.iter().flat_map(|ability| {
                    ability
                        .computed
                        .iter()
                        .map(move |(_, f)| (ability.key.as_str(), f))
                }))
        });
        perks.chain(classes).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::formula::Formula;
    use crate::{UserId, CURRENCY_ITEM_KEY};

    #[test]
    fn test_standard_catalog_formulas_parse() {
        let catalog = Catalog::standard();
        let formulas = catalog.formulas();
        assert!(!formulas.is_empty());
        for (owner, formula) in formulas {
            assert!(
                Formula::parse(formula).is_ok(),
                "{} declares an invalid formula: {}",
                owner,
                formula
            );
        }
    }

    #[test]
    fn test_standard_keys_are_unique() {
        let catalog = Catalog::standard();
        let perk_keys: HashSet<_> = catalog.perks().iter().map(|p| &p.key).collect();
        assert_eq!(perk_keys.len(), catalog.perks().len());

        let class_keys: HashSet<_> = catalog.classes().iter().map(|c| &c.key).collect();
        assert_eq!(class_keys.len(), catalog.classes().len());

        let item_keys: HashSet<_> = catalog.items().iter().map(|i| &i.key).collect();
        assert_eq!(item_keys.len(), catalog.items().len());
    }

    #[test]
    fn test_perk_requirements_name_real_skills() {
        for perk in Catalog::standard().perks() {
            let requirement = perk.requirement.as_ref().unwrap();
            assert!(
                requirement
                    .attribute_key
                    .base_skill_keys()
                    .contains(&requirement.skill_key.as_str()),
                "{} requires unknown skill {}",
                perk.key,
                requirement.skill_key
            );
            assert!((1..=3).contains(&requirement.skill_requirement));
        }
    }

    #[test]
    fn test_implied_abilities_reference_same_class() {
        for class in Catalog::standard().classes() {
            for ability in &class.class_abilities {
                if let AbilityRequirement::ImpliedBy(parent) = &ability.requirement {
                    assert!(class.ability(parent).is_some(), "{} has dangling parent", ability.key);
                }
            }
            assert!(
                !class.attribute_key.base_skill_keys().contains(&class.skill_key.as_str()),
                "{} grants a base skill",
                class.key
            );
        }
    }

    #[test]
    fn test_currency_is_untyped() {
        let currency = Catalog::standard().item(CURRENCY_ITEM_KEY).unwrap();
        assert!(!currency.is_removable());
    }

    #[test]
    fn test_perk_requirement_check() {
        let mut character = Character::new(UserId::new());
        let requirement = PerkRequirement::new(AttributeKey::Strength, "fortitude", 2);
        assert!(!requirement.is_met_by(&character));

        if let Some(skill) = character.attributes.strength.skills.get_mut("fortitude") {
            skill.value = 2;
        }
        assert!(requirement.is_met_by(&character));

        let missing = PerkRequirement::new(AttributeKey::Strength, "tactics", 1);
        assert!(!missing.is_met_by(&character));
    }

    #[test]
    fn test_ability_requirement_wire_format() {
        let json = serde_json::to_value(AbilityRequirement::implied_by("bulwark")).unwrap();
        assert_eq!(json["IMPLIED_BY"], "bulwark");
        assert_eq!(
            serde_json::to_value(AbilityRequirement::Innate).unwrap(),
            "INNATE"
        );
    }
}
