//! API routes
//!
//! One handler per student action. Every session-scoped handler locks the
//! session for its whole duration.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection},
        DefaultBodyLimit, FromRequest, FromRequestParts, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Turn;
use crate::core::{Exchange, PreferenceUpdate, Preferences, Session, SessionError, SessionHandle};
use crate::curriculum::{self, Topic, TopicInfo};
use crate::media::{EncodedImage, MediaError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: Topic,
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

/// What a client needs to render a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub topic: Option<Topic>,
    pub preferences: Preferences,
    pub has_credential: bool,
    pub pending_image: Option<EncodedImage>,
    pub turns: Vec<Turn>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id(),
            created_at: session.created_at(),
            topic: session.topic(),
            preferences: session.preferences(),
            has_credential: session.has_credential(),
            pending_image: session.pending_image().cloned(),
            turns: session.conversation().turns().to_vec(),
        }
    }
}

/// JSON body whose rejections are reported as [`ErrorResponse`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// Path parameters whose rejections are reported as [`ErrorResponse`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct ApiPath<T>(T);

#[derive(Debug)]
enum ApiError {
    SessionNotFound(Uuid),
    Rejected(SessionError),
    Image(MediaError),
    BadRequest(String),
    Extract { status: StatusCode, message: String },
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::Rejected(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Extract {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Extract {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Extract {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("Session not found: {id}")),
            Self::Rejected(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::Image(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Erreur lors du traitement de l'image: {err}"),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Extract { status, message } => (status, message),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_topics() -> Json<Vec<TopicInfo>> {
    Json(curriculum::catalogue())
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let handle = state.sessions.create().await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionView::from(&*session)))
}

async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

async fn end_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn select_topic(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TopicRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.select_topic(request.topic);
    Ok(Json(SessionView::from(&*session)))
}

async fn update_preferences(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PreferenceUpdate>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.update_preferences(update);
    Ok(Json(SessionView::from(&*session)))
}

async fn set_credential(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CredentialRequest>,
) -> Result<StatusCode, ApiError> {
    let api_key = request.api_key.trim();
    if api_key.is_empty() {
        return Err(ApiError::BadRequest("api_key must not be empty".into()));
    }

    let handle = find_session(&state, id).await?;
    handle
        .lock()
        .await
        .set_credential(SecretString::new(api_key.to_string()));
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_credential(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = find_session(&state, id).await?;
    handle.lock().await.clear_credential();
    Ok(StatusCode::NO_CONTENT)
}

/// Normalise an uploaded photo and hold it for the next question.
///
/// A photo that cannot be read is reported and leaves no photo pending.
async fn attach_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EncodedImage>, ApiError> {
    let body = body?;
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;

    let encoder = state.encoder;
    let encoded = tokio::task::spawn_blocking(move || encoder.encode(&body))
        .await
        .map_err(|e| ApiError::Internal(format!("Image task failed: {e}")))?;

    match encoded {
        Ok(image) => {
            session.attach_image(image.clone());
            Ok(Json(image))
        }
        Err(err) => {
            tracing::warn!(session_id = %id, error = %err, "Rejected photo upload");
            session.discard_image();
            Err(ApiError::Image(err))
        }
    }
}

async fn discard_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = find_session(&state, id).await?;
    handle.lock().await.discard_image();
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_question(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<Exchange>, ApiError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    let exchange = session
        .submit_question(&state.tutor, &request.question)
        .await?;
    Ok(Json(exchange))
}

async fn clear_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = find_session(&state, id).await?;
    handle.lock().await.clear_history();
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/topics", get(list_topics))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:id", get(get_session).delete(end_session))
        .route("/v1/sessions/:id/topic", put(select_topic))
        .route("/v1/sessions/:id/preferences", put(update_preferences))
        .route(
            "/v1/sessions/:id/credential",
            put(set_credential).delete(clear_credential),
        )
        .route(
            "/v1/sessions/:id/image",
            put(attach_image)
                .delete(discard_image)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/v1/sessions/:id/messages",
            post(submit_question).delete(clear_history),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;
    use crate::config::{prompts, LlmConfig};
    use crate::core::testing::FakeBackend;
    use crate::core::{SessionStore, TutorClient};
    use crate::media::PhotoEncoder;

    const UPLOAD_LIMIT: usize = 1024 * 1024;

    fn test_app(backend: Arc<FakeBackend>, credential: Option<&str>) -> Router {
        let credential = credential.map(|key| SecretString::new(key.to_string()));
        let state = AppState {
            sessions: Arc::new(SessionStore::new(credential)),
            tutor: TutorClient::new(backend, &LlmConfig::default()),
            encoder: PhotoEncoder::default(),
        };
        router(UPLOAD_LIMIT).with_state(state)
    }

    async fn upload(app: &Router, id: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::PUT)
            .uri(format!("/v1/sessions/{id}/image"))
            .header("content-type", "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn blank_png(width: u32, height: u32) -> Vec<u8> {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_topics() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let (status, body) = send(&app, Method::GET, "/v1/topics", None).await;

        assert_eq!(status, StatusCode::OK);
        let topics = body.as_array().unwrap();
        assert_eq!(topics.len(), 4);
        assert_eq!(topics[0]["id"], "exponents-and-scientific-notation");
        assert_eq!(topics[1]["examples"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let app = test_app(FakeBackend::replying("ok"), Some("sk-provisioned"));
        let (_, body) = send(&app, Method::POST, "/v1/sessions", None).await;

        assert_eq!(body["topic"], Value::Null);
        assert_eq!(body["preferences"], json!({"difficulty": "medium", "show_steps": true}));
        assert_eq!(body["has_credential"], true);
        assert_eq!(body["turns"], json!([]));
    }

    #[tokio::test]
    async fn test_question_flow() {
        let backend = FakeBackend::replying("Il faut isoler x.");
        let app = test_app(backend.clone(), Some("sk-provisioned"));
        let id = new_session(&app).await;

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/v1/sessions/{id}/topic"),
            Some(json!({"topic": "equations"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({"question": "Comment je résous 2x + 5 = 13 ?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Il faut isoler x.");
        assert_eq!(body["outcome"], "answered");
        assert_eq!(body["turn_count"], 2);

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["turns"][0]["role"], "user");
        assert_eq!(view["turns"][1]["content"], "Il faut isoler x.");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_question_without_topic_is_rejected() {
        let backend = FakeBackend::replying("unused");
        let app = test_app(backend.clone(), Some("sk-provisioned"));
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({"question": "Bonjour"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], prompts::CHOOSE_TOPIC_FIRST);

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["turns"], json!([]));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_history_and_preferences() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;

        send(&app, Method::PUT, &format!("/v1/sessions/{id}/topic"), Some(json!({"topic": "geometry"}))).await;
        send(
            &app,
            Method::PUT,
            &format!("/v1/sessions/{id}/preferences"),
            Some(json!({"difficulty": "hard"})),
        )
        .await;
        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({"question": "Pythagore ?"})),
        )
        .await;
        assert_eq!(body["outcome"], "credential_missing");

        let (status, _) = send(&app, Method::DELETE, &format!("/v1/sessions/{id}/messages"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["turns"], json!([]));
        assert_eq!(view["topic"], "geometry");
        assert_eq!(view["preferences"]["difficulty"], "hard");
    }

    #[tokio::test]
    async fn test_credential_actions() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;
        let uri = format!("/v1/sessions/{id}/credential");

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"api_key": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"api_key": "sk-typed"}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["has_credential"], true);

        send(&app, Method::DELETE, &uri, None).await;
        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["has_credential"], false);
    }

    #[tokio::test]
    async fn test_unreadable_image_is_reported() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;

        let (status, body) = upload(&app, &id, b"not a picture".to_vec()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["pending_image"], Value::Null);
    }

    #[tokio::test]
    async fn test_uploaded_photo_goes_with_next_question() {
        let backend = FakeBackend::replying("Je vois un triangle.");
        let app = test_app(backend.clone(), Some("sk-provisioned"));
        let id = new_session(&app).await;
        send(&app, Method::PUT, &format!("/v1/sessions/{id}/topic"), Some(json!({"topic": "geometry"}))).await;

        let (status, body) = upload(&app, &id, blank_png(2100, 700)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"width": 2000, "height": 667}));

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["pending_image"]["width"], 2000);

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({"question": "Quelle est l'aire ?"})),
        )
        .await;
        assert_eq!(body["image_attached"], true);

        let request = backend.last_request().unwrap();
        let last = request.messages.last().unwrap();
        assert_eq!(last.role, crate::conversation::Role::User);
        match &last.content {
            crate::conversation::Content::TextWithImage { image_data_uri, text } => {
                assert!(image_data_uri.starts_with("data:image/jpeg;base64,"));
                assert_eq!(text, "Quelle est l'aire ?");
            }
            other => panic!("expected a photo on the last message, got {other:?}"),
        }

        let (_, view) = send(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(view["pending_image"], Value::Null);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_refused() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;

        let (status, body) = upload(&app, &id, vec![0u8; UPLOAD_LIMIT + 1]).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/v1/sessions/{id}/topic"),
            Some(json!({"topic": "algebra"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("algebra"));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/v1/sessions/{id}/preferences"),
            Some(json!({"difficulty": "extreme"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, Method::GET, "/v1/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/v1/sessions/{id}/messages"))
            .header("content-type", "application/json")
            .body(Body::from("{\"question\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!error.error.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let uri = format!("/v1/sessions/{}", Uuid::new_v4());

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_end_session() {
        let app = test_app(FakeBackend::replying("ok"), None);
        let id = new_session(&app).await;
        let uri = format!("/v1/sessions/{id}");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
