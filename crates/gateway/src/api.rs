//! Chat API handlers.
//!
//! Every handler follows the same shape: resolve the principal from the
//! bearer token, check scope through the guard, then touch the store or
//! the pipeline. Errors map onto a fixed status ladder: validation 400,
//! credential problems 401, scope mismatches 403, missing resources 404,
//! and anything upstream a generic 500 with the cause logged server-side.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use laxbot_chat::{ChatTurnRequest, Difficulty, QuizQuestion};
use laxbot_core::keys::format_timestamp;
use laxbot_core::{Error, ImageAttachment, Principal};

use crate::AppState;

// --- Error mapping ---

/// Wrapper that turns a domain error into an HTTP response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
            Error::Auth(e) if e.is_unauthenticated() => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            Error::Auth(_) => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")),
            Error::Conflict(what) => (StatusCode::CONFLICT, format!("Conflict: {what}")),
            other => {
                // Provider and store failures carry internals the client
                // must not see; the cause goes to the log only.
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn principal(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    Ok(state.guard.principal_from_header(header)?)
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")).into());
    }
    Ok(())
}

// --- Request / response shapes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    family_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    session_id: String,
    mode: Option<String>,
    difficulty: Option<String>,
    image: Option<ImageUpload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    media_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct QuizResponse {
    quiz: Vec<QuizQuestion>,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    family_id: String,
    user_id: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    family_id: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSessionQuery {
    child_user_id: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnQuery {
    family_id: String,
    user_id: String,
    session_id: String,
    /// The user message's sort-key timestamp, echoed back verbatim from
    /// a message listing or a chat reply.
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct MessageItem {
    role: &'static str,
    text: String,
    /// The sort-key timestamp; clients echo it back to delete a turn.
    #[serde(rename = "sortKeyTimestamp")]
    timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    items: Vec<MessageItem>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    sessions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    deleted_count: usize,
}

fn message_items(messages: Vec<laxbot_store::StoredMessage>) -> MessagesResponse {
    MessagesResponse {
        items: messages
            .into_iter()
            .map(|m| MessageItem {
                role: m.role.as_str(),
                text: m.text,
                timestamp: m.timestamp,
            })
            .collect(),
    }
}

// --- Handlers ---

/// One chat or quiz turn.
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let principal = principal(&state, &headers)?;
    require(&body.family_id, "familyId")?;
    require(&body.user_id, "userId")?;
    require(&body.session_id, "sessionId")?;
    state
        .guard
        .authorize_owner(&principal, &body.family_id, &body.user_id)?;

    let image = body.image.map(|i| ImageAttachment {
        media_type: i.media_type,
        data: i.data,
    });
    if body.message.trim().is_empty() && image.is_none() {
        return Err(Error::validation("message or image is required").into());
    }

    match body.mode.as_deref() {
        Some("quiz") => {
            let difficulty = parse_difficulty(body.difficulty.as_deref())?;
            let quiz = state.quiz.generate(&body.message, image, difficulty).await?;
            Ok(Json(QuizResponse {
                quiz,
                timestamp: format_timestamp(Utc::now()),
            })
            .into_response())
        }
        None | Some("chat") => {
            let reply = state
                .orchestrator
                .run(ChatTurnRequest {
                    family_id: body.family_id,
                    user_id: body.user_id,
                    session_id: body.session_id,
                    message: body.message,
                    image,
                })
                .await?;
            Ok(Json(reply).into_response())
        }
        Some(other) => Err(Error::validation(format!("unknown mode '{other}'")).into()),
    }
}

fn parse_difficulty(value: Option<&str>) -> Result<Option<Difficulty>, ApiError> {
    match value {
        None => Ok(None),
        Some("easy") => Ok(Some(Difficulty::Easy)),
        Some("medium") => Ok(Some(Difficulty::Medium)),
        Some("hard") => Ok(Some(Difficulty::Hard)),
        Some(other) => Err(Error::validation(format!("unknown difficulty '{other}'")).into()),
    }
}

/// All messages in one of the caller's own sessions, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let principal = principal(&state, &headers)?;
    state
        .guard
        .authorize_owner(&principal, &query.family_id, &query.user_id)?;

    let messages = state
        .sessions
        .session_messages(&query.family_id, &query.user_id, &query.session_id)
        .await?;
    Ok(Json(message_items(messages)))
}

/// Distinct session ids for the caller, oldest session first.
pub async fn get_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let principal = principal(&state, &headers)?;
    state
        .guard
        .authorize_owner(&principal, &query.family_id, &query.user_id)?;

    let sessions = state
        .sessions
        .list_sessions(&query.family_id, &query.user_id)
        .await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// Parent view: a child's session, readable only when the child belongs
/// to the parent's own family.
pub async fn get_child_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChildSessionQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let principal = principal(&state, &headers)?;
    state
        .guard
        .authorize_parent_view(&principal, &query.child_user_id)
        .await?;

    let messages = state
        .sessions
        .session_messages(&principal.family_id, &query.child_user_id, &query.session_id)
        .await?;
    Ok(Json(message_items(messages)))
}

/// Delete a whole session. 404 when the session has no messages.
pub async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let principal = principal(&state, &headers)?;
    state
        .guard
        .authorize_owner(&principal, &query.family_id, &query.user_id)?;

    let deleted_count = state
        .sessions
        .delete_session(&query.family_id, &query.user_id, &query.session_id)
        .await?;
    Ok(Json(DeleteResponse { deleted_count }))
}

/// Delete one turn, anchored at the user message's timestamp.
pub async fn delete_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TurnQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let principal = principal(&state, &headers)?;
    state
        .guard
        .authorize_owner(&principal, &query.family_id, &query.user_id)?;

    let deleted_count = state
        .sessions
        .delete_turn(
            &query.family_id,
            &query.user_id,
            &query.session_id,
            &query.timestamp,
        )
        .await?;
    Ok(Json(DeleteResponse { deleted_count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use http_body_util::BodyExt;
    use laxbot_auth::{sign_token, AuthGuard, TokenClaims};
    use laxbot_chat::{ChatOrchestrator, QuizGenerator};
    use laxbot_config::{GatewayConfig, ProviderConfig, ToolsConfig};
    use laxbot_core::{
        CompletionRequest, CompletionResponse, Provider, ProviderError, UserProfile, UserRole,
    };
    use laxbot_store::{InMemoryStore, SessionStore};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"gateway-test-secret";

    /// Hands out queued completion replies, empty fallback afterwards.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<std::result::Result<CompletionResponse, ProviderError>>>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(text_reply("fallback")))
        }
    }

    fn text_reply(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: content.into(),
            tool_calls: vec![],
            model: "gpt-4o-mini".into(),
            usage: None,
        }
    }

    struct Fixture {
        router: Router,
        sessions: Arc<SessionStore>,
    }

    fn fixture(
        replies: Vec<std::result::Result<CompletionResponse, ProviderError>>,
    ) -> Fixture {
        let kv = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(SessionStore::new(kv.clone(), 100));
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider {
            replies: Mutex::new(replies.into()),
        });
        let registry = Arc::new(laxbot_tools::default_registry(&ToolsConfig::default()));
        let provider_config = ProviderConfig::default();

        let state = AppState {
            guard: Arc::new(AuthGuard::new(SECRET, kv.clone())),
            orchestrator: Arc::new(ChatOrchestrator::new(
                provider.clone(),
                registry,
                sessions.clone(),
                provider_config.clone(),
            )),
            quiz: Arc::new(QuizGenerator::new(provider, provider_config)),
            sessions: sessions.clone(),
        };

        Fixture {
            router: build_router(state, &GatewayConfig::default()),
            sessions,
        }
    }

    fn bearer(role: UserRole, user_id: &str, family_id: &str) -> String {
        let claims = TokenClaims {
            user_id: user_id.into(),
            username: "anna".into(),
            role,
            family_id: family_id.into(),
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        format!("Bearer {}", sign_token(&claims, SECRET))
    }

    fn child_token() -> String {
        bearer(UserRole::Child, "child1", "fam1")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn request(
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn chat_body(message: &str) -> serde_json::Value {
        serde_json::json!({
            "message": message,
            "familyId": "fam1",
            "userId": "child1",
            "sessionId": "s1",
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let fx = fixture(vec![]);
        let (status, json) = send(&fx.router, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn chat_without_token_is_401() {
        let fx = fixture(vec![]);
        let (status, json) = send(
            &fx.router,
            request("POST", "/api/chat", None, Some(chat_body("Hej"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn chat_with_garbage_token_is_401() {
        let fx = fixture(vec![]);
        let (status, _) = send(
            &fx.router,
            request(
                "POST",
                "/api/chat",
                Some("Bearer not.a.token"),
                Some(chat_body("Hej")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn foreign_family_scope_is_403() {
        let fx = fixture(vec![]);
        let token = bearer(UserRole::Child, "child1", "fam2");
        let (status, json) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&token), Some(chat_body("Hej"))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Forbidden");
    }

    #[tokio::test]
    async fn chat_turn_round_trip() {
        let fx = fixture(vec![Ok(text_reply("Hej! Vad vill du lära dig? 📚"))]);
        let token = child_token();

        let (status, json) = send(
            &fx.router,
            request(
                "POST",
                "/api/chat",
                Some(&token),
                Some(chat_body("Vad är 2+2?")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Hej! Vad vill du lära dig? 📚");
        assert!(json["timestamp"].is_string());

        let (status, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/messages?familyId=fam1&userId=child1&sessionId=s1",
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["role"], "user");
        assert_eq!(items[0]["text"], "Vad är 2+2?");
        assert!(items[0]["sortKeyTimestamp"].is_string());
        assert_eq!(items[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn blank_message_without_image_is_400() {
        let fx = fixture(vec![]);
        let (status, json) = send(
            &fx.router,
            request(
                "POST",
                "/api/chat",
                Some(&child_token()),
                Some(chat_body("   ")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("message"));
    }

    #[tokio::test]
    async fn missing_scope_field_is_400() {
        let fx = fixture(vec![]);
        let body = serde_json::json!({ "message": "Hej", "familyId": "fam1", "userId": "child1" });
        let (status, json) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&child_token()), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("sessionId"));
    }

    #[tokio::test]
    async fn unknown_mode_is_400() {
        let fx = fixture(vec![]);
        let mut body = chat_body("Hej");
        body["mode"] = "battle".into();
        let (status, _) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&child_token()), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quiz_mode_returns_questions_and_persists_nothing() {
        let quiz_json = r#"[
            {"question": "Vad är 2+2?", "options": ["3","4","5","6"],
             "correctAnswer": "4", "explanation": "Två plus två är fyra."}
        ]"#;
        let fx = fixture(vec![Ok(text_reply(quiz_json))]);
        let token = child_token();

        let mut body = chat_body("matte");
        body["mode"] = "quiz".into();
        body["difficulty"] = "easy".into();
        let (status, json) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&token), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let quiz = json["quiz"].as_array().unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0]["correctAnswer"], "4");

        // Quiz turns leave no trace in the session
        let (_, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/messages?familyId=fam1&userId=child1&sessionId=s1",
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(json["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unknown_difficulty_is_400() {
        let fx = fixture(vec![]);
        let mut body = chat_body("matte");
        body["mode"] = "quiz".into();
        body["difficulty"] = "impossible".into();
        let (status, _) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&child_token()), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_is_a_generic_500() {
        let fx = fixture(vec![Err(ProviderError::ApiError {
            status_code: 503,
            message: "upstream exploded with key sk-secret".into(),
        })]);
        let token = child_token();

        let (status, json) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&token), Some(chat_body("Hej"))),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");

        // A failed turn persists nothing
        let (_, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/messages?familyId=fam1&userId=child1&sessionId=s1",
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(json["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_missing_session_is_404() {
        let fx = fixture(vec![]);
        let (status, _) = send(
            &fx.router,
            request(
                "DELETE",
                "/api/chat/session?familyId=fam1&userId=child1&sessionId=nope",
                Some(&child_token()),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_session_reports_count() {
        let fx = fixture(vec![Ok(text_reply("Svar ett")), Ok(text_reply("Svar två"))]);
        let token = child_token();

        for message in ["Fråga ett", "Fråga två"] {
            let (status, _) = send(
                &fx.router,
                request("POST", "/api/chat", Some(&token), Some(chat_body(message))),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json) = send(
            &fx.router,
            request(
                "DELETE",
                "/api/chat/session?familyId=fam1&userId=child1&sessionId=s1",
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deletedCount"], 4);
    }

    #[tokio::test]
    async fn delete_single_turn_removes_the_pair() {
        let fx = fixture(vec![Ok(text_reply("Svar ett")), Ok(text_reply("Svar två"))]);
        let token = child_token();

        let (_, first) = send(
            &fx.router,
            request("POST", "/api/chat", Some(&token), Some(chat_body("Fråga ett"))),
        )
        .await;
        send(
            &fx.router,
            request("POST", "/api/chat", Some(&token), Some(chat_body("Fråga två"))),
        )
        .await;

        let anchor = first["timestamp"].as_str().unwrap();
        let uri = format!(
            "/api/chat/message?familyId=fam1&userId=child1&sessionId=s1&timestamp={anchor}"
        );
        let (status, json) = send(&fx.router, request("DELETE", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deletedCount"], 2);

        let (_, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/messages?familyId=fam1&userId=child1&sessionId=s1",
                Some(&token),
                None,
            ),
        )
        .await;
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["text"], "Fråga två");
    }

    #[tokio::test]
    async fn sessions_listing_is_distinct() {
        let fx = fixture(vec![Ok(text_reply("Ett")), Ok(text_reply("Två"))]);
        let token = child_token();

        for session in ["s1", "s2"] {
            let body = serde_json::json!({
                "message": "Hej",
                "familyId": "fam1",
                "userId": "child1",
                "sessionId": session,
            });
            send(
                &fx.router,
                request("POST", "/api/chat", Some(&token), Some(body)),
            )
            .await;
        }

        let (status, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/sessions?familyId=fam1&userId=child1",
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["sessions"],
            serde_json::json!(["s1", "s2"])
        );
    }

    #[tokio::test]
    async fn parent_can_read_child_session() {
        let fx = fixture(vec![Ok(text_reply("Hej liten vän!"))]);

        fx.sessions
            .put_profile(
                "fam1",
                "child1",
                &UserProfile {
                    username: "liam".into(),
                    role: UserRole::Child,
                    birth_date: None,
                },
            )
            .await
            .unwrap();

        // Child has one turn in the session
        send(
            &fx.router,
            request(
                "POST",
                "/api/chat",
                Some(&child_token()),
                Some(chat_body("Hej")),
            ),
        )
        .await;

        let parent = bearer(UserRole::Parent, "parent1", "fam1");
        let (status, json) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/child/messages?childUserId=child1&sessionId=s1",
                Some(&parent),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn parent_view_rejects_non_parents_and_foreign_children() {
        let fx = fixture(vec![]);

        // Child tokens cannot use the parent view at all
        let (status, _) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/child/messages?childUserId=other&sessionId=s1",
                Some(&child_token()),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // A parent cannot read a child that has no profile in the family
        let parent = bearer(UserRole::Parent, "parent1", "fam1");
        let (status, _) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/child/messages?childUserId=stranger&sessionId=s1",
                Some(&parent),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_query_params_are_rejected() {
        let fx = fixture(vec![]);
        let (status, _) = send(
            &fx.router,
            request(
                "GET",
                "/api/chat/messages?familyId=fam1",
                Some(&child_token()),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
