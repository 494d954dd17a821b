//! Session encounters (initiative tracker)

use serde::{Deserialize, Serialize};

use crate::{CharacterId, EncounterId, SessionId};

/// Condition shown on a participant card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantCondition {
    Healthy,
    /// At or below half health, but not down
    Bloodied,
    /// Zero health
    Incapacitated,
}

impl ParticipantCondition {
    pub fn from_health(health: u32, max_health: u32) -> Self {
        if health == 0 {
            Self::Incapacitated
        } else if u64::from(health) * 2 <= u64::from(max_health) {
            Self::Bloodied
        } else {
            Self::Healthy
        }
    }
}

/// An encounter participant: either a session character or an ad-hoc combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Participant {
    #[serde(rename_all = "camelCase")]
    Character {
        character_id: CharacterId,
        initiative: Option<i32>,
    },
    #[serde(rename_all = "camelCase")]
    Combatant {
        name: String,
        initiative: Option<i32>,
        health_points: u32,
        max_health_points: u32,
    },
}

impl Participant {
    pub fn initiative(&self) -> Option<i32> {
        match self {
            Self::Character { initiative, .. } | Self::Combatant { initiative, .. } => *initiative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: EncounterId,
    pub session_id: SessionId,
    pub name: String,
    pub turn: u32,
    pub hidden: bool,
    pub participants: Vec<Participant>,
}

impl Encounter {
    /// A newly created encounter: hidden, unnamed, empty, turn 0.
    pub fn seeded(session_id: SessionId) -> Self {
        Self {
            id: EncounterId::new(),
            session_id,
            name: String::new(),
            turn: 0,
            hidden: true,
            participants: Vec::new(),
        }
    }

    /// Order participants by initiative, highest first. Ties keep their order;
    /// participants without initiative go last.
    pub fn sort_by_initiative(&mut self) {
        self.participants
            .sort_by(|a, b| b.initiative().cmp(&a.initiative()));
    }

    /// Advance the turn counter, wrapping to 0 after the last participant.
    pub fn next_turn(&mut self) {
        if self.participants.is_empty() {
            self.turn = 0;
        } else {
            self.turn = (self.turn + 1) % self.participants.len() as u32;
        }
    }

    /// Participant whose turn it is
    pub fn current(&self) -> Option<&Participant> {
        self.participants.get(self.turn as usize)
    }
}
