//! HTTP request bodies

use serde::{Deserialize, Serialize};
use vademecum_domain::{CharacterId, Participant, RollEvaluation};

/// Principal header set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub name: String,
}

/// A finished roll to post to the session log. The server assigns id and
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRollRequest {
    pub character_id: CharacterId,
    pub label: String,
    pub dice: Vec<u8>,
    pub evaluation: RollEvaluation,
}

/// Full replacement of an encounter's mutable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEncounterRequest {
    pub name: String,
    pub turn: u32,
    pub hidden: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_roll_request_camel_case() {
        let request = CreateRollRequest {
            character_id: CharacterId::new(),
            label: "Power".to_string(),
            dice: vec![3, 5],
            evaluation: RollEvaluation::Check,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("characterId").is_some());
        assert_eq!(json["evaluation"], "CHECK");
    }

    #[test]
    fn test_update_encounter_defaults_participants() {
        let request: UpdateEncounterRequest =
            serde_json::from_str(r#"{"name":"Ambush","turn":1,"hidden":false}"#).unwrap();
        assert!(request.participants.is_empty());
    }
}
