//! HTTP routes.
//!
//! The principal is supplied by the upstream gateway in the `x-user-id`
//! header; requests without a valid one are rejected with `403`.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use thiserror::Error;

use vademecum_domain::{
    Character, CharacterId, DomainError, Encounter, EncounterId, Roll, Session, SessionId, UserId,
};
use vademecum_shared::{
    CreateRollRequest, CreateSessionRequest, ErrorBody, HealthResponse, UpdateEncounterRequest,
    UpdateSessionRequest, USER_ID_HEADER,
};

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).put(rename_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/characters", get(list_session_characters))
        .route(
            "/api/sessions/{id}/characters/{character_id}",
            post(add_session_character),
        )
        .route(
            "/api/sessions/{id}/rolls",
            get(list_rolls).post(create_roll).delete(clear_rolls),
        )
        .route(
            "/api/sessions/{id}/encounters",
            get(list_encounters).post(create_encounter),
        )
        .route(
            "/api/sessions/{id}/encounters/{encounter_id}",
            put(update_encounter),
        )
        .route("/api/characters", post(create_character))
        .route(
            "/api/characters/{id}",
            get(get_character).put(update_character).delete(delete_character),
        )
}

// =============================================================================
// Principal
// =============================================================================

/// Authenticated caller, read from the `x-user-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub UserId);

impl Principal {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse().ok())
            .map(Principal)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(ApiError::Unauthorized)
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn create_session(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = app.create_session(user_id, &body.name)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(app): State<Arc<App>>,
    Principal(_): Principal,
    Path(id): Path<SessionId>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(app.get_session(id)?))
}

async fn rename_session(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<SessionId>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(app.rename_session(user_id, id, &body.name)?))
}

async fn delete_session(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    app.delete_session(user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_session_characters(
    State(app): State<Arc<App>>,
    Principal(_): Principal,
    Path(id): Path<SessionId>,
) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(app.session_characters(id)?))
}

async fn add_session_character(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path((id, character_id)): Path<(SessionId, CharacterId)>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(app.add_session_character(user_id, id, character_id).await?))
}

async fn list_rolls(
    State(app): State<Arc<App>>,
    Principal(_): Principal,
    Path(id): Path<SessionId>,
) -> Result<Json<Vec<Roll>>, ApiError> {
    Ok(Json(app.rolls(id)?))
}

async fn create_roll(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<SessionId>,
    Json(body): Json<CreateRollRequest>,
) -> Result<(StatusCode, Json<Roll>), ApiError> {
    let roll = app.create_roll(user_id, id, body).await?;
    Ok((StatusCode::CREATED, Json(roll)))
}

async fn clear_rolls(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    app.clear_rolls(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_encounters(
    State(app): State<Arc<App>>,
    Principal(_): Principal,
    Path(id): Path<SessionId>,
) -> Result<Json<Vec<Encounter>>, ApiError> {
    Ok(Json(app.encounters(id)?))
}

async fn create_encounter(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<SessionId>,
) -> Result<(StatusCode, Json<Encounter>), ApiError> {
    let encounter = app.create_encounter(user_id, id).await?;
    Ok((StatusCode::CREATED, Json(encounter)))
}

async fn update_encounter(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path((id, encounter_id)): Path<(SessionId, EncounterId)>,
    Json(body): Json<UpdateEncounterRequest>,
) -> Result<Json<Encounter>, ApiError> {
    Ok(Json(app.update_encounter(user_id, id, encounter_id, body).await?))
}

async fn create_character(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
) -> (StatusCode, Json<Character>) {
    (StatusCode::CREATED, Json(app.create_character(user_id)))
}

async fn get_character(
    State(app): State<Arc<App>>,
    Principal(_): Principal,
    Path(id): Path<CharacterId>,
) -> Result<Json<Character>, ApiError> {
    Ok(Json(app.get_character(id)?))
}

async fn update_character(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<CharacterId>,
    Json(body): Json<Character>,
) -> Result<Json<Character>, ApiError> {
    Ok(Json(app.update_character(user_id, id, body).await?))
}

async fn delete_character(
    State(app): State<Arc<App>>,
    Principal(user_id): Principal,
    Path(id): Path<CharacterId>,
) -> Result<StatusCode, ApiError> {
    app.delete_character(user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized.")]
    Unauthorized,
    #[error("Invalid query params.")]
    InvalidQueryParams,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::InvalidQueryParams => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::NotOwner { .. } => StatusCode::FORBIDDEN,
                DomainError::Constraint(_) => StatusCode::CONFLICT,
                DomainError::Validation(_)
                | DomainError::InvalidId(_)
                | DomainError::Computation(_) => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use crate::api::connections::ConnectionManager;
    use crate::infrastructure::SystemClock;

    fn router() -> Router {
        let app = Arc::new(App::new(
            Arc::new(ConnectionManager::new()),
            Arc::new(SystemClock),
        ));
        routes().with_state(app)
    }

    fn request(method: Method, uri: &str, user: Option<UserId>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_principal_is_forbidden_with_detail() {
        let response = router()
            .oneshot(request(Method::POST, "/api/characters", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: ErrorBody = json_body(response).await;
        assert_eq!(body, ErrorBody::unauthorized());
    }

    #[tokio::test]
    async fn health_needs_no_principal() {
        let response = router()
            .oneshot(request(Method::GET, "/api/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: HealthResponse = json_body(response).await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn session_lifecycle_over_http() {
        let router = router();
        let owner = UserId::new();

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/sessions",
                Some(owner),
                Some(serde_json::json!({ "name": "Friday table" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let session: Session = json_body(response).await;

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/sessions/{}/encounters", session.id),
                Some(owner),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let encounter: Encounter = json_body(response).await;
        assert!(encounter.hidden);

        let response = router
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/sessions/{}", session.id),
                Some(UserId::new()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/sessions/{}", session.id),
                Some(owner),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(request(
                Method::GET,
                &format!("/api/sessions/{}", session.id),
                Some(owner),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = json_body(response).await;
        assert!(body.detail.contains("Session"));
    }

    #[tokio::test]
    async fn character_create_and_update() {
        let router = router();
        let owner = UserId::new();

        let response = router
            .clone()
            .oneshot(request(Method::POST, "/api/characters", Some(owner), None))
            .await
            .unwrap();
        let mut character: Character = json_body(response).await;
        assert_eq!(character.user_id, owner);

        character.name = "Odo".to_string();
        let response = router
            .oneshot(request(
                Method::PUT,
                &format!("/api/characters/{}", character.id),
                Some(owner),
                Some(serde_json::to_value(&character).unwrap()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved: Character = json_body(response).await;
        assert_eq!(saved.name, "Odo");
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(DomainError::not_found("Session", "x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::not_owner("Session", "x")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(DomainError::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidQueryParams.to_string(), "Invalid query params.");
    }
}
