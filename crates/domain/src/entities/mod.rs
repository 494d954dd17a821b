//! Domain entities

mod character;
mod encounter;
mod roll;
mod session;

pub use character::{
    capitalize, Attribute, AttributeKey, Attributes, Character, CharacterUpdate, ItemQuantity,
    Skill, CURRENCY_ITEM_KEY, DEFAULT_HEALTH_POINTS, MAX_ATTRIBUTE_VALUE, MAX_LEVEL,
    MAX_LEVEL_POINTS, MAX_SKILL_VALUE, MIN_ATTRIBUTE_VALUE, MIN_LEVEL, MIN_SKILL_VALUE,
};
pub use encounter::{Encounter, Participant, ParticipantCondition};
pub use roll::{pool_size, sort_newest_first, DiceFactor, Roll, RollEvaluation, DIE_SIDES};
pub use session::Session;
