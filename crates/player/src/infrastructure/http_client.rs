//! HTTP adapter for the record store

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use vademecum_domain::{
    Character, CharacterId, Encounter, EncounterId, Roll, Session, SessionId, UserId,
};
use vademecum_shared::{
    CreateRollRequest, CreateSessionRequest, ErrorBody, UpdateEncounterRequest,
    UpdateSessionRequest, USER_ID_HEADER,
};

use crate::ports::outbound::{StoreError, StorePort};

/// Default store base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest client for the engine's `/api` surface
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    user_id: UserId,
}

impl HttpStore {
    pub fn new(base_url: &str, user_id: UserId) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(USER_ID_HEADER, self.user_id.to_string())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.detail)
            .unwrap_or(text);
        tracing::debug!(status = status.as_u16(), detail = %detail, "Store request rejected");
        Err(StoreError::status(status.as_u16(), detail))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn empty(&self, request: RequestBuilder) -> Result<(), StoreError> {
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl StorePort for HttpStore {
    async fn create_character(&self) -> Result<Character, StoreError> {
        self.json(self.client.post(self.url("/characters"))).await
    }

    async fn get_character(&self, id: CharacterId) -> Result<Character, StoreError> {
        self.json(self.client.get(self.url(&format!("/characters/{id}"))))
            .await
    }

    async fn update_character(&self, character: &Character) -> Result<Character, StoreError> {
        let url = self.url(&format!("/characters/{}", character.id));
        self.json(self.client.put(url).json(character)).await
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), StoreError> {
        self.empty(self.client.delete(self.url(&format!("/characters/{id}"))))
            .await
    }

    async fn create_session(&self, name: &str) -> Result<Session, StoreError> {
        let body = CreateSessionRequest {
            name: name.to_string(),
        };
        self.json(self.client.post(self.url("/sessions")).json(&body))
            .await
    }

    async fn get_session(&self, id: SessionId) -> Result<Session, StoreError> {
        self.json(self.client.get(self.url(&format!("/sessions/{id}"))))
            .await
    }

    async fn rename_session(&self, id: SessionId, name: &str) -> Result<Session, StoreError> {
        let body = UpdateSessionRequest {
            name: name.to_string(),
        };
        self.json(
            self.client
                .put(self.url(&format!("/sessions/{id}")))
                .json(&body),
        )
        .await
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        self.empty(self.client.delete(self.url(&format!("/sessions/{id}"))))
            .await
    }

    async fn add_session_character(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> Result<Session, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/characters/{character_id}"));
        self.json(self.client.post(url)).await
    }

    async fn list_session_characters(&self, session_id: SessionId) -> Result<Vec<Character>, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/characters"));
        self.json(self.client.get(url)).await
    }

    async fn list_session_rolls(&self, session_id: SessionId) -> Result<Vec<Roll>, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/rolls"));
        self.json(self.client.get(url)).await
    }

    async fn create_session_roll(
        &self,
        session_id: SessionId,
        request: &CreateRollRequest,
    ) -> Result<Roll, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/rolls"));
        self.json(self.client.post(url).json(request)).await
    }

    async fn delete_session_rolls(&self, session_id: SessionId) -> Result<(), StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/rolls"));
        self.empty(self.client.delete(url)).await
    }

    async fn list_session_encounters(&self, session_id: SessionId) -> Result<Vec<Encounter>, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/encounters"));
        self.json(self.client.get(url)).await
    }

    async fn create_session_encounter(&self, session_id: SessionId) -> Result<Encounter, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/encounters"));
        self.json(self.client.post(url)).await
    }

    async fn update_session_encounter(
        &self,
        session_id: SessionId,
        encounter_id: EncounterId,
        request: &UpdateEncounterRequest,
    ) -> Result<Encounter, StoreError> {
        let url = self.url(&format!("/sessions/{session_id}/encounters/{encounter_id}"));
        self.json(self.client.put(url).json(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpStore::new("http://localhost:3000/api/", UserId::new());
        assert_eq!(store.url("/sessions"), "http://localhost:3000/api/sessions");
    }

    #[tokio::test]
    async fn unreachable_store_is_transport_error() {
        let store = HttpStore::new("http://127.0.0.1:1/api", UserId::new());

        let result = store.get_session(SessionId::new()).await;

        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}
