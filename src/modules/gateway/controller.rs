use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use tracing::error;
use validator::Validate;

use crate::modules::comms::{
    model::{Message, Sender},
    schema::{parse_limit, ErrorResponse},
};
use crate::modules::gateway::schema::{
    Channels, DegradedStatusResponse, GatewayHistoryQuery, SendMessageRequest, SendMessageResponse,
    SessionActionRequest, BACKOFFICE_TAG, DEFAULT_SOURCE, SETUP_GUIDANCE,
};
use crate::services::gateway::{GatewayError, GatewayMessage};
use crate::AppState;

fn unavailable(e: GatewayError) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(e)).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

fn to_message(m: &GatewayMessage) -> Message {
    let millis = m
        .timestamp
        .filter(|t| t.is_finite())
        .map(|t| t as i64)
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let timestamp = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339();

    Message {
        id: millis.to_string(),
        content: m.content.clone(),
        sender: Sender::from_role(&m.role),
        timestamp,
        metadata: None,
    }
}

// Newest `limit` entries, oldest first.
fn most_recent<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(limit);
    items.drain(..skip);
    items
}

pub async fn history(State(state): State<AppState>, Query(query): Query<GatewayHistoryQuery>) -> Response {
    let Some(session_key) = query.session_key.filter(|k| !k.is_empty()) else {
        return bad_request("sessionKey required");
    };
    let limit = parse_limit(query.limit.as_deref()) as usize;

    match state.gateway.get_history(&session_key).await {
        Ok(history) => {
            let messages: Vec<Message> = most_recent(history, limit).iter().map(to_message).collect();
            Json(messages).into_response()
        }
        Err(e) => unavailable(e),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(p)) if p.validate().is_ok() => p,
        _ => return bad_request("sessionKey and message are required"),
    };

    let metadata = json!({
        "tags": [BACKOFFICE_TAG],
        "source": payload.source.as_deref().unwrap_or(DEFAULT_SOURCE),
    });

    match state
        .gateway
        .send_message(&payload.session_key, &payload.message, Some(&metadata))
        .await
    {
        Ok(()) => Json(SendMessageResponse {
            success: true,
            message: "Message sent successfully".to_string(),
        })
        .into_response(),
        Err(e) => {
            error!("Error in send-message API: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details("Failed to send message", e.details)),
            )
                .into_response()
        }
    }
}

pub async fn list_sessions(State(state): State<AppState>) -> Response {
    match state.gateway.list_sessions().await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(e) => unavailable(e),
    }
}

pub async fn session_action(
    State(state): State<AppState>,
    payload: Result<Json<SessionActionRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(payload)) = payload else {
        return bad_request("Invalid action");
    };

    match (payload.action.as_deref(), payload.session_key) {
        (Some("history"), Some(session_key)) if !session_key.is_empty() => {
            match state.gateway.get_history_raw(&session_key).await {
                Ok(history) => Json(history).into_response(),
                Err(e) => unavailable(e),
            }
        }
        _ => bad_request("Invalid action"),
    }
}

pub async fn status(State(state): State<AppState>) -> Response {
    match state.gateway.get_status().await {
        Ok(upstream) => {
            let mut body = Map::new();
            body.insert("gateway".to_string(), json!("online"));
            body.insert(
                "channels".to_string(),
                json!({ "telegram": true, "webchat": true }),
            );
            body.insert("memory".to_string(), json!("connected"));
            body.insert("lastHeartbeat".to_string(), json!(Utc::now().to_rfc3339()));
            // Upstream fields override the defaults.
            body.extend(upstream);
            Json(Value::Object(body)).into_response()
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DegradedStatusResponse {
                gateway: "offline",
                channels: Channels {
                    telegram: false,
                    webchat: false,
                },
                memory: "disconnected",
                last_heartbeat: "never",
                error: e.error,
                details: e.details,
                gateway_url: e.gateway_url,
                timestamp: e.timestamp,
                setup: SETUP_GUIDANCE,
            }),
        )
            .into_response(),
    }
}
