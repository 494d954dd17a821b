//! Inventory items

use super::{Item, ItemType};
use crate::{AttributeKey, CURRENCY_ITEM_KEY};

pub(super) fn standard_items() -> Vec<Item> {
    vec![
        Item::new(CURRENCY_ITEM_KEY, "Currency", None)
            .with_description("Coins, trade goods and IOUs."),
        Item::new("rations", "Rations", Some(ItemType::Consumable))
            .with_description("A day of food. Eating restores one point of satiation.")
            .with_weight(1),
        Item::new("healing_draught", "Healing Draught", Some(ItemType::Consumable))
            .with_description("Drink to recover health equal to a Medicine check.")
            .with_weight(1)
            .with_bonus(AttributeKey::Intelligence, "medicine", 1),
        Item::new("rope", "Rope", Some(ItemType::Tool))
            .with_description("Fifty feet of hemp rope.")
            .with_weight(2)
            .with_bonus(AttributeKey::Strength, "athletics", 1),
        Item::new("lockpicks", "Lockpicks", Some(ItemType::Tool))
            .with_weight(1)
            .with_bonus(AttributeKey::Dexterity, "precision", 1),
        Item::new("lantern", "Lantern", Some(ItemType::Tool))
            .with_weight(1)
            .with_bonus(AttributeKey::Perception, "investigation", 1),
        Item::new("bedroll", "Bedroll", Some(ItemType::Tool)).with_weight(2),
        Item::new("dagger", "Dagger", Some(ItemType::Weapon))
            .with_weight(1)
            .with_bonus(AttributeKey::Dexterity, "precision", 1)
            .with_damage(2),
        Item::new("longsword", "Longsword", Some(ItemType::Weapon))
            .with_weight(3)
            .with_bonus(AttributeKey::Strength, "power", 1)
            .with_damage(3),
        Item::new("shortbow", "Shortbow", Some(ItemType::Weapon))
            .with_weight(2)
            .with_bonus(AttributeKey::Dexterity, "precision", 1)
            .with_damage(2),
        Item::new("warhammer", "Warhammer", Some(ItemType::Weapon))
            .with_weight(4)
            .with_bonus(AttributeKey::Strength, "power", 2)
            .with_damage(4),
        Item::new("shield", "Shield", Some(ItemType::Armor))
            .with_weight(3)
            .with_bonus(AttributeKey::Strength, "fortitude", 1),
        Item::new("leather_armor", "Leather Armor", Some(ItemType::Armor))
            .with_weight(4)
            .with_bonus(AttributeKey::Dexterity, "agility", 1),
        Item::new("lucky_charm", "Lucky Charm", Some(ItemType::Trinket))
            .with_bonus(AttributeKey::Charisma, "luck", 1),
    ]
}
