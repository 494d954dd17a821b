//! Acquirable perks, three per skill at increasing skill requirements

use super::{Perk, PerkRequirement};
use crate::computation::{ComputationKey, ComputedOverrides};
use crate::AttributeKey;

fn perk(
    key: &str,
    name: &str,
    description: &str,
    attribute_key: AttributeKey,
    skill_key: &str,
    skill_requirement: u8,
) -> Perk {
    Perk::new(key, name, description).with_requirement(PerkRequirement::new(
        attribute_key,
        skill_key,
        skill_requirement,
    ))
}

pub(super) fn standard_perks() -> Vec<Perk> {
    vec![
        perk(
            "bloody_knuckles",
            "Bloody Knuckles",
            "You double your Power bonus on skill checks to make a melee attack without a weapon.",
            AttributeKey::Strength,
            "power",
            1,
        ),
        perk(
            "dead_lift",
            "Dead Lift",
            "You double your Power bonus on skill checks to lift or move a heavy object.",
            AttributeKey::Strength,
            "power",
            2,
        ),
        perk(
            "battering_ram",
            "Battering Ram",
            "You double your Power bonus on skill checks to force your way through an obstacle.",
            AttributeKey::Strength,
            "power",
            3,
        ),
        perk(
            "human_shield",
            "Human Shield",
            "You act as light cover in combat for all characters within 10ft behind you.",
            AttributeKey::Strength,
            "fortitude",
            1,
        ),
        perk(
            "pack_mule",
            "Pack Mule",
            "Your carrying capacity is increased by a number of slots equal to your Strength + Fortitude.",
            AttributeKey::Strength,
            "fortitude",
            2,
        )
        .with_computed(ComputedOverrides::none().with(ComputationKey::CarryingCapacity, "[base] + [attribute.strength] + [skill.fortitude]")),
        perk(
            "night_owl",
            "Night Owl",
            "During a Rest, you can complete an additional Rest Activity with -1 disadvantage.",
            AttributeKey::Strength,
            "fortitude",
            3,
        ),
        perk(
            "trainer",
            "Trainer",
            "You give allies +1 advantage on Athletics checks.",
            AttributeKey::Strength,
            "athletics",
            1,
        ),
        perk(
            "free_solo",
            "Free Solo",
            "You double your Athletics bonus on skill checks to climb without equipment.",
            AttributeKey::Strength,
            "athletics",
            2,
        ),
        perk(
            "big_brother",
            "Big Brother",
            "If an ally within 10ft is hit with an attack, you can leap in to switch places, taking all damage.",
            AttributeKey::Strength,
            "athletics",
            3,
        ),
        perk(
            "locksmith",
            "Locksmith",
            "You double your Precision bonus on skill checks to pick a lock.",
            AttributeKey::Dexterity,
            "precision",
            1,
        ),
        perk(
            "steady_aim",
            "Steady Aim",
            "You double your Precision bonus on skill checks to make a ranged attack from behind cover.",
            AttributeKey::Dexterity,
            "precision",
            2,
        ),
        perk(
            "snipers_nest",
            "Sniper's Nest",
            "You double your Precision bonus on skill checks to make a ranged attack from an elevated position.",
            AttributeKey::Dexterity,
            "precision",
            3,
        ),
        perk(
            "black_mass",
            "Black Mass",
            "You double your Stealth bonus on skill checks when cloaked by natural darkness.",
            AttributeKey::Dexterity,
            "stealth",
            1,
        ),
        perk(
            "lone_wolf",
            "Lone Wolf",
            "You double your Stealth bonus on skill checks while on your own.",
            AttributeKey::Dexterity,
            "stealth",
            2,
        ),
        perk(
            "assassin",
            "Assassin",
            "When an enemy is surprised, you can make a weapon attack with advantage equivalent to your Stealth.",
            AttributeKey::Dexterity,
            "stealth",
            3,
        ),
        perk(
            "escapist",
            "Escapist",
            "You double your Agility bonus on skill checks to escape someone or a situation.",
            AttributeKey::Dexterity,
            "agility",
            1,
        ),
        perk(
            "untouchable",
            "Untouchable",
            "Opportunity attacks on you have disadvantage equivalent to your Agility.",
            AttributeKey::Dexterity,
            "agility",
            2,
        ),
        perk(
            "fleet_foot",
            "Fleet Foot",
            "You are not impeded by Rough Terrain.",
            AttributeKey::Dexterity,
            "agility",
            3,
        ),
        perk(
            "book_worm",
            "Book Worm",
            "You double your Intellect bonus on skill checks to comprehend written information.",
            AttributeKey::Intelligence,
            "intellect",
            1,
        ),
        perk(
            "linguist",
            "Linguist",
            "You double your Intellect bonus on skill checks to comprehend a foreign language.",
            AttributeKey::Intelligence,
            "intellect",
            2,
        ),
        perk(
            "strategist",
            "Strategist",
            "When you plan a surprise attack, you add +3 advantage to the Stealth roll to surprise the enemy.",
            AttributeKey::Intelligence,
            "intellect",
            3,
        ),
        perk(
            "spiritual_healer",
            "Spiritual Healer",
            "You can stabilize allies from up to 15 ft away.",
            AttributeKey::Intelligence,
            "medicine",
            1,
        ),
        perk(
            "field_medic",
            "Field Medic",
            "On a stalemate Medicine check to stabilize an ally, you decrease the injury level by one.",
            AttributeKey::Intelligence,
            "medicine",
            2,
        ),
        perk(
            "witch_doctor",
            "Witch Doctor",
            "Even when incapacitated with a deadly injury, you can roll to stabilize yourself.",
            AttributeKey::Intelligence,
            "medicine",
            3,
        ),
        perk(
            "junk_collector",
            "Junk Collector",
            "You double your Engineering bonus on skill checks to craft an item using junk.",
            AttributeKey::Intelligence,
            "engineering",
            1,
        ),
        perk(
            "inventor",
            "Inventor",
            "You double your Engineering bonus on skill checks to build something unique.",
            AttributeKey::Intelligence,
            "engineering",
            2,
        ),
        perk(
            "repairman",
            "Repairman",
            "On a successful Engineering check to repair an item, you can also repair a second item.",
            AttributeKey::Intelligence,
            "engineering",
            3,
        ),
        perk(
            "polygraph",
            "Polygraph",
            "You double your Intuition bonus on skill checks to determine if an NPC is lying.",
            AttributeKey::Charisma,
            "intuition",
            1,
        ),
        perk(
            "empath",
            "Empath",
            "You double your Intuition bonus on skill checks to determine an NPC's true emotional state.",
            AttributeKey::Charisma,
            "intuition",
            2,
        ),
        perk(
            "counselor",
            "Counselor",
            "After a successful Intuition check against an NPC, you get +3 advantage on your next Influence check using that information.",
            AttributeKey::Charisma,
            "intuition",
            3,
        ),
        perk(
            "relatable",
            "Relatable",
            "You double your Influence bonus on skill checks against NPC's from the same race or class.",
            AttributeKey::Charisma,
            "influence",
            1,
        ),
        perk(
            "identity_theft",
            "Identity Theft",
            "You double your Influence bonus on skill checks while impersonating someone else.",
            AttributeKey::Charisma,
            "influence",
            2,
        ),
        perk(
            "folk_hero",
            "Folk Hero",
            "You double the advantage given to Influence checks by Renown.",
            AttributeKey::Charisma,
            "influence",
            3,
        ),
        perk(
            "gold_rush",
            "Gold Rush",
            "After passing an Investigation check to loot after combat, you can roll a Luck check. On a success, you find double the amount of currency units.",
            AttributeKey::Charisma,
            "luck",
            1,
        ),
        perk(
            "serendipity",
            "Serendipity",
            "Once per Rest, you can replace a failed skill check with a new Luck check.",
            AttributeKey::Charisma,
            "luck",
            2,
        ),
        perk(
            "close_call",
            "Close Call",
            "Once per Rest, you can roll a Luck check after being incapacitated. On a success, you are reduced to 1 HP instead.",
            AttributeKey::Charisma,
            "luck",
            3,
        ),
        perk(
            "architect",
            "Architect",
            "You double your Insight bonus on skill checks against man-made structures.",
            AttributeKey::Perception,
            "insight",
            1,
        ),
        perk(
            "ecologist",
            "Ecologist",
            "You double your Insight bonus on skill checks against natural phenomena, such as animals, plants, weather, and terrain.",
            AttributeKey::Perception,
            "insight",
            2,
        ),
        perk(
            "inspector",
            "Inspector",
            "After a successful Insight check, you get +3 advantage on your next Investigation/Detection check using that information.",
            AttributeKey::Perception,
            "insight",
            3,
        ),
        perk(
            "combat_ready",
            "Combat Ready",
            "You add 2D6 to your initiative roll.",
            AttributeKey::Perception,
            "detection",
            1,
        )
        .with_computed(ComputedOverrides::none().with(ComputationKey::Initiative, "[base] + 2")),
        perk(
            "sixth_sense",
            "Sixth Sense",
            "You can't be surprised during combat.",
            AttributeKey::Perception,
            "detection",
            2,
        ),
        perk(
            "one_eye_open",
            "One Eye Open",
            "You can keep watch for enemies during a Rest without expending a Rest Activity.",
            AttributeKey::Perception,
            "detection",
            3,
        ),
        perk(
            "loot_goblin",
            "Loot Goblin",
            "You double your Investigation bonus on skill checks to loot after combat.",
            AttributeKey::Perception,
            "investigation",
            1,
        ),
        perk(
            "emergency_exit",
            "Emergency Exit",
            "You double your Investigation bonus on skill checks to find an exit or escape route.",
            AttributeKey::Perception,
            "investigation",
            2,
        ),
        perk(
            "detective",
            "Detective",
            "You double your Investigation bonus on skill checks to search for clues in pursuit of your personal or party's goal.",
            AttributeKey::Perception,
            "investigation",
            3,
        ),
    ]
}
