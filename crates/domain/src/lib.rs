//! Vade Mecum domain: character sheets, the rule catalog and the stat
//! computation engine. No I/O, no async.

pub mod catalog;
pub mod character_client;
pub mod computation;
pub mod entities;
pub mod error;
pub mod formula;
pub mod ids;

pub use entities::{
    capitalize, pool_size, sort_newest_first, Attribute, AttributeKey, Attributes, Character,
    CharacterUpdate, DiceFactor, Encounter, ItemQuantity, Participant, ParticipantCondition, Roll,
    RollEvaluation, Session, Skill, CURRENCY_ITEM_KEY, DEFAULT_HEALTH_POINTS, DIE_SIDES,
    MAX_ATTRIBUTE_VALUE, MAX_LEVEL, MAX_LEVEL_POINTS, MAX_SKILL_VALUE, MIN_ATTRIBUTE_VALUE,
    MIN_LEVEL, MIN_SKILL_VALUE,
};

pub use catalog::{
    AbilityRequirement, Catalog, Class, ClassAbility, Item, ItemBonus, ItemType, Perk,
    PerkRequirement, Race,
};
pub use character_client::{CharacterClient, ClassView, InventoryLine};
pub use computation::{ComputationError, ComputationKey, ComputationResolver, ComputedOverrides};
pub use error::DomainError;
pub use formula::{Formula, FormulaError, Namespace};

pub use ids::{CharacterId, ConnectionId, EncounterId, RollId, SessionId, UserId};
