use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use validator::Validate;

use crate::modules::comms::{
    model::{Message, Sender, StoredMessage, DEFAULT_SESSION_KEY},
    schema::{parse_limit, ErrorResponse, HistoryQuery, RelayRequest, RelayResponse},
};
use crate::AppState;

fn message_required() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Message required")),
    )
}

// Only a bad body is an error; store and wake failures degrade to partial success.
pub async fn relay(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|_| message_required())?;
    if payload.validate().is_err() {
        return Err(message_required());
    }

    let session_key = payload
        .session_key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());

    let row = StoredMessage::new(session_key.clone(), Sender::User, &payload.message, None);
    let store_id = match state.store.insert(row).await {
        Ok(id) => Some(id.to_hex()),
        Err(e) => {
            warn!("Message store save failed (non-fatal): {}", e);
            None
        }
    };

    let webhook_sent = match &state.notifier {
        Some(notifier) => {
            let push = notifier.dispatch(payload.message, session_key.clone(), store_id.clone());
            match push.await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Wake push task failed (non-fatal): {}", e);
                    false
                }
            }
        }
        None => false,
    };

    info!(
        "Relayed message for session {} (stored: {}, webhook sent: {})",
        session_key,
        store_id.is_some(),
        webhook_sent
    );

    Ok(Json(RelayResponse {
        success: true,
        store_id,
        webhook_sent,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>, (StatusCode, Json<ErrorResponse>)> {
    let session_key = query
        .session_key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());
    let limit = parse_limit(query.limit.as_deref());

    let rows = state.store.recent(&session_key, limit).await.map_err(|e| {
        warn!("Message store query failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch messages")),
        )
    })?;

    Ok(Json(rows.iter().map(StoredMessage::to_message).collect()))
}
