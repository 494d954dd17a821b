//! Classes and their ability trees

use super::{AbilityRequirement, Class, ClassAbility};
use crate::computation::{ComputationKey, ComputedOverrides};
use crate::AttributeKey;

fn ability(key: &str, name: &str, description: &str, requirement: AbilityRequirement) -> ClassAbility {
    ClassAbility::new(key, name, description, requirement)
}

pub(super) fn standard_classes() -> Vec<Class> {
    vec![
        Class::new(
            "knight",
            "Knight",
            "Armored protector who holds the line.",
            AttributeKey::Strength,
            "defense",
        )
        .with_computed(ComputedOverrides::none().with(
            ComputationKey::MaxClassPoints,
            "[attribute.strength] + [skill.defense] + [classItemBonus]",
        ))
        .with_abilities(vec![
            ability(
                "shield_wall",
                "Shield Wall",
                "Allies adjacent to you count as being in light cover.",
                AbilityRequirement::Innate,
            ),
            ability(
                "bulwark",
                "Bulwark",
                "Your maximum health is increased by twice your level.",
                AbilityRequirement::ByKey,
            )
            .with_computed(
                ComputedOverrides::none().with(ComputationKey::MaxHealthPoints, "[base] + [level] * 2"),
            ),
            ability(
                "iron_will",
                "Iron Will",
                "You cannot be frightened while above half health.",
                AbilityRequirement::implied_by("bulwark"),
            ),
            ability(
                "unbreakable",
                "Unbreakable",
                "Once per Rest, spend a class point to ignore an injury.",
                AbilityRequirement::implied_by("iron_will"),
            ),
            ability(
                "challenge",
                "Challenge",
                "Spend a class point to force an enemy to target you.",
                AbilityRequirement::ByKey,
            ),
        ]),
        Class::new(
            "ranger",
            "Ranger",
            "Scout and hunter of the wild places.",
            AttributeKey::Dexterity,
            "survival",
        )
        .with_computed(
            ComputedOverrides::none()
                .with(ComputationKey::MaxClassPoints, "[level] + [skill.survival]")
                .with(ComputationKey::Speed, "4 + [attribute.dexterity] + [skill.agility]"),
        )
        .with_abilities(vec![
            ability(
                "tracker",
                "Tracker",
                "You double your Survival bonus on checks to follow tracks.",
                AbilityRequirement::Innate,
            ),
            ability(
                "swift_stride",
                "Swift Stride",
                "Your speed is increased by 2.",
                AbilityRequirement::ByKey,
            )
            .with_computed(ComputedOverrides::none().with(ComputationKey::Speed, "[base] + 2")),
            ability(
                "hunters_mark",
                "Hunter's Mark",
                "Spend a class point to mark a target; your attacks against it gain +1 advantage.",
                AbilityRequirement::implied_by("swift_stride"),
            ),
            ability(
                "forager",
                "Forager",
                "You carry an extra slot for every point of Survival.",
                AbilityRequirement::ByKey,
            )
            .with_computed(ComputedOverrides::none().with(
                ComputationKey::CarryingCapacity,
                "[base] + [skill.survival]",
            )),
        ]),
        Class::new(
            "alchemist",
            "Alchemist",
            "Brewer of volatile tinctures.",
            AttributeKey::Intelligence,
            "alchemy",
        )
        .with_computed(ComputedOverrides::none().with(
            ComputationKey::MaxClassPoints,
            "([attribute.intelligence] + [skill.alchemy]) * 2",
        ))
        .with_abilities(vec![
            ability(
                "brew",
                "Brew",
                "During a Rest, spend class points to brew that many draughts.",
                AbilityRequirement::Innate,
            ),
            ability(
                "volatile_mix",
                "Volatile Mix",
                "Thrown draughts explode, dealing damage equal to your Alchemy.",
                AbilityRequirement::ByKey,
            ),
            ability(
                "philosophers_stone",
                "Philosopher's Stone",
                "Your class item stores extra class points.",
                AbilityRequirement::implied_by("volatile_mix"),
            )
            .with_computed(ComputedOverrides::none().with(
                ComputationKey::MaxClassPoints,
                "[base] + [classItemBonus] * 2",
            )),
        ]),
        Class::new(
            "bard",
            "Bard",
            "Storyteller whose words move crowds.",
            AttributeKey::Charisma,
            "performance",
        )
        .with_computed(ComputedOverrides::none().with(
            ComputationKey::MaxClassPoints,
            "[attribute.charisma] + [skill.performance] + [classItemBonus]",
        ))
        .with_abilities(vec![
            ability(
                "inspire",
                "Inspire",
                "Spend a class point to give an ally +1 advantage on their next check.",
                AbilityRequirement::Innate,
            ),
            ability(
                "encore",
                "Encore",
                "Once per encounter, regain a spent class point.",
                AbilityRequirement::ByKey,
            ),
            ability(
                "lucky_break",
                "Lucky Break",
                "You add your Performance to looting checks.",
                AbilityRequirement::ByKey,
            )
            .with_computed(
                ComputedOverrides::none().with(ComputationKey::Looting, "[base] + [skill.performance]"),
            ),
        ]),
        Class::new(
            "seer",
            "Seer",
            "Reader of omens who sees trouble coming.",
            AttributeKey::Perception,
            "foresight",
        )
        .with_computed(
            ComputedOverrides::none()
                .with(
                    ComputationKey::MaxClassPoints,
                    "[attribute.perception] + [skill.foresight]",
                )
                .with(
                    ComputationKey::Initiative,
                    "[attribute.dexterity] + [skill.agility] + [attribute.perception] + [skill.detection] + [skill.foresight]",
                ),
        )
        .with_abilities(vec![
            ability(
                "premonition",
                "Premonition",
                "Your initiative is increased by 1.",
                AbilityRequirement::Innate,
            )
            .with_computed(ComputedOverrides::none().with(ComputationKey::Initiative, "[base] + 1")),
            ability(
                "third_eye",
                "Third Eye",
                "Spend a class point to ask the GM one yes-or-no question about the scene.",
                AbilityRequirement::ByKey,
            ),
            ability(
                "fate_weaver",
                "Fate Weaver",
                "Once per Rest, swap the results of two dice rolled by any characters.",
                AbilityRequirement::implied_by("third_eye"),
            ),
        ]),
    ]
}
