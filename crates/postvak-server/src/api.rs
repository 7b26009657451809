use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use postvak_shared::draft::MessageDraft;
use postvak_shared::envelope::ResponseEnvelope;
use postvak_shared::error::AuthError;
use postvak_shared::types::{MessageId, ThreadId};
use postvak_store::{Database, MessageRecord, User};

use crate::auth::Authorize;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::views::{self, MessageView};
use crate::workflow::{self, MessageWorkflow};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub workflow: Arc<MessageWorkflow>,
    pub authorizer: Arc<dyn Authorize>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/messages/create", post(create_message))
        .route("/api/messages/inbox", get(inbox))
        .route("/api/messages/outbox", get(outbox))
        .route("/api/messages/thread/:thread_id", get(thread))
        .route("/api/messages/:id", get(message_details))
        .route("/api/messages/:id/read", post(mark_read))
        .route(
            "/api/messages/:id/archive",
            post(archive_message).delete(unarchive_message),
        )
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct CreateParams {
    #[serde(rename = "receiverUsername")]
    receiver_username: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create and send one message.
///
/// Domain outcomes (unknown receiver, rejected content, unexpected faults)
/// all come back as a 200 with a [`ResponseEnvelope`]; only authentication
/// failures surface as error statuses.
async fn create_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CreateParams>,
    Json(draft): Json<MessageDraft>,
) -> Result<Json<ResponseEnvelope>, ServerError> {
    let sender = authorize(&state, &headers, "/api/messages/create")?;

    let envelope = match state
        .workflow
        .create(&sender, &draft, params.receiver_username.as_deref())
    {
        Ok(_) => ResponseEnvelope::ok(workflow::MSG_SENT),
        Err(failure) => failure.to_envelope(),
    };

    Ok(Json(envelope))
}

/// Messages the caller received and has not archived.
async fn inbox(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages/inbox")?;

    let db = lock_db(&state)?;
    let records = db.inbox_for(user.id)?;
    Ok(Json(views::assemble_all(&db, &records)?))
}

/// Messages the caller sent and has not archived.
async fn outbox(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages/outbox")?;

    let db = lock_db(&state)?;
    let records = db.outbox_for(user.id)?;
    Ok(Json(views::assemble_all(&db, &records)?))
}

/// One conversation, oldest first, restricted to messages the caller
/// participates in.
async fn thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(thread_id): Path<i64>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages/thread")?;

    let db = lock_db(&state)?;
    let records: Vec<_> = db
        .thread_messages(ThreadId(thread_id))?
        .into_iter()
        .filter(|m| m.sender == user.id || m.receiver == user.id)
        .collect();
    Ok(Json(views::assemble_all(&db, &records)?))
}

async fn message_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<MessageView>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages")?;

    let db = lock_db(&state)?;
    let record = db.get_message(MessageId(id))?;
    require_participant(&record, &user)?;

    let views = views::assemble_all(&db, std::slice::from_ref(&record))?;
    views
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ServerError::Internal("stored message missing its id".to_string()))
}

/// Set the shared read flag.
async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages/read")?;

    let db = lock_db(&state)?;
    let record = db.get_message(MessageId(id))?;
    require_participant(&record, &user)?;

    db.mark_read(MessageId(id))?;
    Ok(Json(serde_json::json!({ "read": true })))
}

async fn archive_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    set_archive(state, headers, MessageId(id), true)
}

async fn unarchive_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    set_archive(state, headers, MessageId(id), false)
}

/// Archive or unarchive for the calling party only.  The other party's flag
/// is never touched here.
fn set_archive(
    state: AppState,
    headers: HeaderMap,
    id: MessageId,
    archived: bool,
) -> Result<Json<serde_json::Value>, ServerError> {
    let user = authorize(&state, &headers, "/api/messages/archive")?;

    let db = lock_db(&state)?;
    let record = db.get_message(id)?;

    if record.sender == user.id {
        db.set_archived_by_sender(id, archived)?;
    } else if record.receiver == user.id {
        db.set_archived_by_receiver(id, archived)?;
    } else {
        return Err(ServerError::Forbidden(
            "Not a participant in this message".to_string(),
        ));
    }

    info!(message_id = %id, user = %user.id, archived, "archive flag updated");
    Ok(Json(serde_json::json!({ "archived": archived })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    Some(auth.strip_prefix("Bearer ").unwrap_or(auth))
}

/// Authenticate the caller.  A missing header counts as a missing credential;
/// every failure here surfaces as a transport error, never as an envelope.
fn authorize(state: &AppState, headers: &HeaderMap, resource: &str) -> Result<User, ServerError> {
    let token = bearer_token(headers).ok_or(AuthError::CredentialNotFound)?;
    Ok(state.authorizer.authorize(token, resource)?)
}

fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Database>, ServerError> {
    state
        .db
        .lock()
        .map_err(|e| ServerError::Internal(format!("store lock poisoned: {e}")))
}

fn require_participant(record: &MessageRecord, user: &User) -> Result<(), ServerError> {
    if record.sender == user.id || record.receiver == user.id {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "Not a participant in this message".to_string(),
        ))
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
