use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bson::oid::ObjectId;
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

use crate::modules::comms::{
    model::{truncate_chars, Message, Sender, StoredMessage, MAX_CONTENT_CHARS},
    schema::ErrorResponse,
};
use crate::modules::gateway::schema::BACKOFFICE_TAG;
use crate::modules::webhook::schema::{BufferQuery, BufferResponse, ReplyAck, ReplyRequest, SECRET_HEADER};
use crate::AppState;

fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == secret)
}

// Ours when it carries the routing tag or comes from the agent role.
pub fn is_backoffice_reply(metadata: Option<&Value>, sender: Option<&str>) -> bool {
    let tagged = metadata
        .and_then(|m| m.get("tags"))
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(BACKOFFICE_TAG)));

    tagged || sender == Some("assistant")
}

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReplyAck>, (StatusCode, Json<ErrorResponse>)> {
    if !is_authorized(&headers, &state.settings.webhook_secret) {
        return Err((StatusCode::UNAUTHORIZED, Json(ErrorResponse::new("Unauthorized"))));
    }

    let payload: ReplyRequest = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Invalid webhook payload", e.to_string())),
        )
    })?;

    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Invalid webhook payload", e.to_string())),
        ));
    }

    if !is_backoffice_reply(payload.metadata.as_ref(), payload.sender.as_deref()) {
        return Ok(Json(ReplyAck {
            success: true,
            received: false,
            reason: Some("Not a backoffice message".to_string()),
        }));
    }

    // Buffer and store must agree on content for the shared id.
    let content = truncate_chars(&payload.message, MAX_CONTENT_CHARS);
    let id = ObjectId::new();
    let reply = Message {
        id: id.to_hex(),
        content: content.clone(),
        sender: Sender::Ai,
        timestamp: Utc::now().to_rfc3339(),
        metadata: payload.metadata.clone(),
    };
    state.replies.push(&payload.session_key, reply);

    let row = StoredMessage::new(payload.session_key.clone(), Sender::Ai, &content, payload.metadata)
        .with_id(id);
    if let Err(e) = state.store.insert(row).await {
        warn!("Reply store save failed (non-fatal): {}", e);
    }

    info!("Received reply for session {}", payload.session_key);

    Ok(Json(ReplyAck {
        success: true,
        received: true,
        reason: None,
    }))
}

pub async fn buffered(
    State(state): State<AppState>,
    Query(query): Query<BufferQuery>,
) -> Result<Json<BufferResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session_key = query.session_key.filter(|k| !k.is_empty()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("sessionKey is required")),
        )
    })?;

    let messages = state.replies.snapshot(&session_key);
    let count = messages.len();

    Ok(Json(BufferResponse { messages, count }))
}
