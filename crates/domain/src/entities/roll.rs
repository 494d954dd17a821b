//! Dice rolls posted to a session's roll log
//!
//! A roll is a pool of six-sided dice. The pool size is the sum of its dice
//! factors (attribute, skill, item bonus, minus exhaustion). Rolling itself is
//! done by an injected roller so the domain stays free of randomness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CharacterId, RollId};

pub const DIE_SIDES: u8 = 6;

/// How a roll's dice are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollEvaluation {
    /// Skill check: the highest die counts
    Check,
    /// Damage and similar: all dice are summed
    Sum,
}

/// One contribution to a dice pool. Negative values shrink the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFactor {
    pub label: String,
    pub value: i32,
}

impl DiceFactor {
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Number of dice rolled for a set of factors, never negative.
pub fn pool_size(factors: &[DiceFactor]) -> usize {
    let total: i32 = factors.iter().map(|factor| factor.value).sum();
    usize::try_from(total).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roll {
    pub id: RollId,
    pub character_id: CharacterId,
    pub label: String,
    pub dice: Vec<u8>,
    pub evaluation: RollEvaluation,
    pub timestamp: DateTime<Utc>,
}

impl Roll {
    /// Roll a pool, drawing each die from `roller` (expected to yield 1..=6).
    pub fn roll(
        character_id: CharacterId,
        label: impl Into<String>,
        factors: &[DiceFactor],
        evaluation: RollEvaluation,
        timestamp: DateTime<Utc>,
        mut roller: impl FnMut() -> u8,
    ) -> Self {
        let dice = (0..pool_size(factors)).map(|_| roller()).collect();
        Self {
            id: RollId::new(),
            character_id,
            label: label.into(),
            dice,
            evaluation,
            timestamp,
        }
    }

    /// Result of the roll under its evaluation mode. An empty pool yields 0.
    pub fn result(&self) -> u32 {
        match self.evaluation {
            RollEvaluation::Check => self.dice.iter().copied().max().map(u32::from).unwrap_or(0),
            RollEvaluation::Sum => self.dice.iter().map(|die| u32::from(*die)).sum(),
        }
    }
}

/// Sort a roll log newest first.
pub fn sort_newest_first(rolls: &mut [Roll]) {
    rolls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn factors() -> Vec<DiceFactor> {
        vec![
            DiceFactor::new("Strength", 3),
            DiceFactor::new("Power", 2),
            DiceFactor::new("Exhaustion", -1),
        ]
    }

    #[test]
    fn test_pool_size_sums_factors() {
        assert_eq!(pool_size(&factors()), 4);
        assert_eq!(pool_size(&[DiceFactor::new("Exhaustion", -3)]), 0);
    }

    #[test]
    fn test_check_takes_highest_die() {
        let mut faces = [4u8, 6, 2, 3].into_iter();
        let roll = Roll::roll(
            CharacterId::new(),
            "Power",
            &factors(),
            RollEvaluation::Check,
            Utc::now(),
            || faces.next().unwrap_or(1),
        );
        assert_eq!(roll.dice, vec![4, 6, 2, 3]);
        assert_eq!(roll.result(), 6);
    }

    #[test]
    fn test_sum_adds_all_dice() {
        let roll = Roll::roll(
            CharacterId::new(),
            "Dagger",
            &[DiceFactor::new("Damage", 3)],
            RollEvaluation::Sum,
            Utc::now(),
            || 5,
        );
        assert_eq!(roll.result(), 15);
    }

    #[test]
    fn test_empty_pool_result_is_zero() {
        let roll = Roll::roll(
            CharacterId::new(),
            "Tired",
            &[DiceFactor::new("Exhaustion", -2)],
            RollEvaluation::Check,
            Utc::now(),
            || 6,
        );
        assert!(roll.dice.is_empty());
        assert_eq!(roll.result(), 0);
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let older = Roll::roll(CharacterId::new(), "a", &[], RollEvaluation::Sum, now - Duration::seconds(5), || 1);
        let newer = Roll::roll(CharacterId::new(), "b", &[], RollEvaluation::Sum, now, || 1);
        let mut rolls = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut rolls);
        assert_eq!(rolls, vec![newer, older]);
    }

    #[test]
    fn test_evaluation_wire_format() {
        assert_eq!(serde_json::to_string(&RollEvaluation::Check).unwrap(), "\"CHECK\"");
        assert_eq!(serde_json::to_string(&RollEvaluation::Sum).unwrap(), "\"SUM\"");
    }
}
