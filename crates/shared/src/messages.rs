//! Push-event envelope and client control messages
//!
//! Server to client: `{ "event": "ROLL_CREATED", "data": { ... } }`.
//! Client to server: `{ "action": "ping" }`.
//!
//! Envelopes are decoded in two steps: first the outer `{event, data}` shape,
//! then the payload according to the event tag. An unrecognized tag is not an
//! error; it decodes to [`ServerEvent::Unknown`] so the receiver can log and
//! drop it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vademecum_domain::{Character, Encounter, Roll};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("Invalid {event} payload: {source}")]
    InvalidPayload {
        event: EventType,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Push event tags. The envelope carries the tag as a plain string, so
/// `as_str` and `parse` are the only mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    RollCreated,
    RollsDeleted,
    EncounterUpdated,
    CharacterUpdated,
    Pong,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::RollCreated,
        Self::RollsDeleted,
        Self::EncounterUpdated,
        Self::CharacterUpdated,
        Self::Pong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RollCreated => "ROLL_CREATED",
            Self::RollsDeleted => "ROLLS_DELETED",
            Self::EncounterUpdated => "ENCOUNTER_UPDATED",
            Self::CharacterUpdated => "CHARACTER_UPDATED",
            Self::Pong => "PONG",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "ROLL_CREATED" => Some(Self::RollCreated),
            "ROLLS_DELETED" => Some(Self::RollsDeleted),
            "ENCOUNTER_UPDATED" => Some(Self::EncounterUpdated),
            "CHARACTER_UPDATED" => Some(Self::CharacterUpdated),
            "PONG" => Some(Self::Pong),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outer push-event shape with the payload left undecoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A decoded push event
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    RollCreated(Roll),
    RollsDeleted,
    EncounterUpdated(Encounter),
    CharacterUpdated(Character),
    Pong,
    /// Tag not known to this client
    Unknown(String),
}

impl ServerEvent {
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::RollCreated(_) => Some(EventType::RollCreated),
            Self::RollsDeleted => Some(EventType::RollsDeleted),
            Self::EncounterUpdated(_) => Some(EventType::EncounterUpdated),
            Self::CharacterUpdated(_) => Some(EventType::CharacterUpdated),
            Self::Pong => Some(EventType::Pong),
            Self::Unknown(_) => None,
        }
    }

    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: EventEnvelope =
            serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, ProtocolError> {
        let Some(event) = EventType::parse(&envelope.event) else {
            return Ok(Self::Unknown(envelope.event));
        };

        let invalid = |source| ProtocolError::InvalidPayload { event, source };
        match event {
            EventType::RollCreated => serde_json::from_value(envelope.data)
                .map(Self::RollCreated)
                .map_err(invalid),
            EventType::RollsDeleted => Ok(Self::RollsDeleted),
            EventType::EncounterUpdated => serde_json::from_value(envelope.data)
                .map(Self::EncounterUpdated)
                .map_err(invalid),
            EventType::CharacterUpdated => serde_json::from_value(envelope.data)
                .map(Self::CharacterUpdated)
                .map_err(invalid),
            EventType::Pong => Ok(Self::Pong),
        }
    }

    pub fn to_envelope(&self) -> Result<EventEnvelope, ProtocolError> {
        let (event, data) = match self {
            Self::RollCreated(roll) => (
                EventType::RollCreated.as_str().to_string(),
                serde_json::to_value(roll).map_err(ProtocolError::Encode)?,
            ),
            Self::RollsDeleted => (
                EventType::RollsDeleted.as_str().to_string(),
                serde_json::Value::Null,
            ),
            Self::EncounterUpdated(encounter) => (
                EventType::EncounterUpdated.as_str().to_string(),
                serde_json::to_value(encounter).map_err(ProtocolError::Encode)?,
            ),
            Self::CharacterUpdated(character) => (
                EventType::CharacterUpdated.as_str().to_string(),
                serde_json::to_value(character).map_err(ProtocolError::Encode)?,
            ),
            Self::Pong => (EventType::Pong.as_str().to_string(), serde_json::Value::Null),
            Self::Unknown(tag) => (tag.clone(), serde_json::Value::Null),
        };
        Ok(EventEnvelope { event, data })
    }

    /// Encode as a text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(&self.to_envelope()?).map_err(ProtocolError::Encode)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Liveness check; answered with `PONG`
    Ping,
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vademecum_domain::{CharacterId, RollEvaluation, SessionId, UserId};

    #[test]
    fn test_ping_wire_format() {
        assert_eq!(ClientMessage::Ping.encode().unwrap(), r#"{"action":"ping"}"#);
        let parsed: ClientMessage = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert_eq!(parsed, ClientMessage::Ping);
    }

    #[test]
    fn test_event_tags_parse_back() {
        for event in EventType::ALL {
            assert_eq!(EventType::parse(event.as_str()), Some(event));
        }
        assert_eq!(EventType::parse("roll_created"), None);
    }

    #[test]
    fn test_decode_roll_created() {
        let roll = Roll::roll(
            CharacterId::new(),
            "Power",
            &[vademecum_domain::DiceFactor::new("Strength", 2)],
            RollEvaluation::Check,
            Utc::now(),
            || 4,
        );
        let text = ServerEvent::RollCreated(roll.clone()).encode().unwrap();
        assert!(text.contains(r#""event":"ROLL_CREATED""#));
        assert_eq!(ServerEvent::decode(&text).unwrap(), ServerEvent::RollCreated(roll));
    }

    #[test]
    fn test_decode_events_without_payload() {
        assert_eq!(
            ServerEvent::decode(r#"{"event":"ROLLS_DELETED"}"#).unwrap(),
            ServerEvent::RollsDeleted
        );
        assert_eq!(
            ServerEvent::decode(r#"{"event":"PONG","data":null}"#).unwrap(),
            ServerEvent::Pong
        );
    }

    #[test]
    fn test_unknown_event_is_not_an_error() {
        let event = ServerEvent::decode(r#"{"event":"MAP_UPDATED","data":{}}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown("MAP_UPDATED".to_string()));
        assert_eq!(event.event_type(), None);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(
            ServerEvent::decode("not json"),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            ServerEvent::decode(r#"{"data":{}}"#),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            ServerEvent::decode(r#"{"event":"CHARACTER_UPDATED","data":{"id":7}}"#),
            Err(ProtocolError::InvalidPayload {
                event: EventType::CharacterUpdated,
                ..
            })
        ));
    }

    #[test]
    fn test_encounter_updated_payload() {
        let encounter = vademecum_domain::Encounter::seeded(SessionId::new());
        let envelope = ServerEvent::EncounterUpdated(encounter.clone())
            .to_envelope()
            .unwrap();
        assert_eq!(envelope.event, "ENCOUNTER_UPDATED");
        assert_eq!(envelope.data["hidden"], true);
        assert_eq!(
            ServerEvent::from_envelope(envelope).unwrap(),
            ServerEvent::EncounterUpdated(encounter)
        );

        let character = vademecum_domain::Character::new(UserId::new());
        let text = ServerEvent::CharacterUpdated(character.clone()).encode().unwrap();
        assert_eq!(
            ServerEvent::decode(&text).unwrap(),
            ServerEvent::CharacterUpdated(character)
        );
    }
}
