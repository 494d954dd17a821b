//! Playable races, each carrying one always-on perk

use super::{Perk, Race};
use crate::computation::{ComputationKey, ComputedOverrides};

pub(super) fn standard_races() -> Vec<Race> {
    vec![
        Race::new(
            "human",
            "Human",
            "Adaptable folk found in every corner of the world.",
            Perk::new(
                "adaptable",
                "Adaptable",
                "Once per Rest, you can reroll a single die on a failed skill check.",
            ),
        ),
        Race::new(
            "dwarf",
            "Dwarf",
            "Stout mountain dwellers, hard to put down.",
            Perk::new(
                "stout",
                "Stout",
                "Your maximum health is increased by your level.",
            )
            .with_computed(
                ComputedOverrides::none().with(ComputationKey::MaxHealthPoints, "[base] + [level]"),
            ),
        ),
        Race::new(
            "elf",
            "Elf",
            "Long-lived and watchful.",
            Perk::new(
                "keen_senses",
                "Keen Senses",
                "You add your Detection to your initiative a second time.",
            )
            .with_computed(
                ComputedOverrides::none().with(ComputationKey::Initiative, "[base] + [skill.detection]"),
            ),
        ),
        Race::new(
            "halfling",
            "Halfling",
            "Small, quick and hard to pin down.",
            Perk::new("nimble", "Nimble", "Your speed is increased by 1.")
                .with_computed(ComputedOverrides::none().with(ComputationKey::Speed, "[base] + 1")),
        ),
        Race::new(
            "orc",
            "Orc",
            "Powerful wanderers used to hauling their homes with them.",
            Perk::new(
                "beast_of_burden",
                "Beast of Burden",
                "Your carrying capacity is increased by twice your Strength.",
            )
            .with_computed(ComputedOverrides::none().with(
                ComputationKey::CarryingCapacity,
                "[base] + [attribute.strength] * 2",
            )),
        ),
    ]
}
