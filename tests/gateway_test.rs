mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use backoffice::modules::comms::crud::MemoryMessageStore;
use backoffice::services::gateway::{GatewayClient, UNREACHABLE};
use common::{refused_url, settings, spawn_upstream, test_server};
use serde_json::{json, Value};

type Sent = Arc<Mutex<Vec<(String, Value)>>>;

async fn history(Path(key): Path<String>) -> axum::response::Response {
    match key.as_str() {
        "html" => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html><body>tunnel offline</body></html>",
        )
            .into_response(),
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "sparse" => Json(json!([
            { "role": "user", "content": "hi", "timestamp": 1_770_000_000_000_i64 },
            { "role": "assistant", "content": "no ts" },
            { "role": "assistant", "content": "float ts", "timestamp": 1_770_000_020_000.0_f64 },
            { "role": "user", "timestamp": 1_770_000_030_000_i64 }
        ]))
        .into_response(),
        _ => Json(json!([
            { "role": "user", "content": "status report?", "timestamp": 1_770_000_000_000_i64 },
            { "id": "m1", "role": "assistant", "content": "all green", "timestamp": 1_770_000_005_000_i64, "metadata": { "k": 1 } },
            { "role": "user", "content": "thanks", "timestamp": 1_770_000_010_000_i64 }
        ]))
        .into_response(),
    }
}

/// Fake agent gateway. Records every send it accepts.
async fn spawn_gateway() -> (String, Sent) {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let recorder = sent.clone();

    let router = Router::new()
        .route(
            "/api/sessions",
            get(|| async {
                Json(json!([
                    { "sessionKey": "s1", "agentId": "main", "lastActivity": "2026-02-10T03:00:00Z", "messageCount": 3 }
                ]))
            }),
        )
        .route("/api/sessions/{key}/history", get(history))
        .route(
            "/api/sessions/{key}/send",
            post(move |Path(key): Path<String>, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    if key == "broken" {
                        return StatusCode::INTERNAL_SERVER_ERROR;
                    }
                    recorder.lock().unwrap().push((key, body));
                    StatusCode::OK
                }
            }),
        )
        .route(
            "/api/status",
            get(|| async { Json(json!({ "version": "2.4.1", "memory": "warm" })) }),
        );

    (spawn_upstream(router).await, sent)
}

async fn spawn_hanging_gateway() -> String {
    let router = Router::new().route(
        "/api/sessions",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!([]))
        }),
    );
    spawn_upstream(router).await
}

#[tokio::test]
async fn test_client_times_out_hanging_gateway() {
    let url = spawn_hanging_gateway().await;
    let client = GatewayClient::new(&url, Duration::from_millis(200));

    let started = Instant::now();
    let err = client.list_sessions().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(200) + Duration::from_secs(2));
    assert_eq!(err.error, UNREACHABLE);
    assert!(err.details.contains("timed out after 200ms"));
    assert_eq!(err.gateway_url, url);
}

#[tokio::test]
async fn test_client_reports_configured_url() {
    let configured = format!("{}/", refused_url().await);
    let client = GatewayClient::new(&configured, Duration::from_secs(2));

    let err = client.list_sessions().await.unwrap_err();

    assert_eq!(err.gateway_url, configured);
}

#[tokio::test]
async fn test_client_rejects_non_json_history() {
    let (url, _) = spawn_gateway().await;
    let client = GatewayClient::new(&url, Duration::from_secs(2));

    let err = client.get_history("html").await.unwrap_err();

    assert_eq!(err.error, UNREACHABLE);
    assert_eq!(
        err.details,
        "Gateway returned text/html; charset=utf-8 instead of JSON"
    );
}

#[tokio::test]
async fn test_client_reports_http_status() {
    let (url, _) = spawn_gateway().await;
    let client = GatewayClient::new(&url, Duration::from_secs(2));

    let err = client.get_history("missing").await.unwrap_err();
    assert_eq!(err.details, "HTTP 404: Not Found");

    let err = client.send_message("broken", "hi", None).await.unwrap_err();
    assert_eq!(err.details, "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn test_client_lists_sessions() {
    let (url, _) = spawn_gateway().await;
    let client = GatewayClient::new(&url, Duration::from_secs(2));

    let sessions = client.list_sessions().await.unwrap();

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_key, "s1");
    assert_eq!(sessions[0].agent_id, "main");
    assert_eq!(sessions[0].message_count, 3);
}

#[tokio::test]
async fn test_history_endpoint_maps_messages() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/messages").add_query_param("sessionKey", "s1").await;

    response.assert_status(StatusCode::OK);
    let messages: Vec<Value> = response.json();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["id"], "1770000000000");
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["sender"], "ai");
    assert_eq!(messages[1]["content"], "all green");
    assert!(messages[0]["timestamp"].as_str().unwrap().starts_with("2026-02-02T"));
}

#[tokio::test]
async fn test_history_endpoint_applies_limit() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let messages: Vec<Value> = server
        .get("/api/messages")
        .add_query_param("sessionKey", "s1")
        .add_query_param("limit", 2)
        .await
        .json();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "all green");
    assert_eq!(messages[1]["content"], "thanks");
}

#[tokio::test]
async fn test_history_endpoint_tolerates_sparse_entries() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/messages").add_query_param("sessionKey", "sparse").await;

    response.assert_status(StatusCode::OK);
    let messages: Vec<Value> = response.json();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["id"], "1770000000000");

    let fallback: i64 = messages[1]["id"].as_str().unwrap().parse().unwrap();
    assert!(fallback > 1_770_000_000_000);
    assert_eq!(messages[1]["content"], "no ts");
    assert!(messages[1]["timestamp"].is_string());

    assert_eq!(messages[2]["id"], "1770000020000");
    assert_eq!(messages[3]["content"], "");
    assert_eq!(messages[3]["sender"], "user");
}

#[tokio::test]
async fn test_history_endpoint_ignores_bad_limit() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server
        .get("/api/messages")
        .add_query_param("sessionKey", "s1")
        .add_query_param("limit", "abc")
        .await;

    response.assert_status(StatusCode::OK);
    let messages: Vec<Value> = response.json();
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn test_history_endpoint_requires_session_key() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/messages").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "sessionKey required");
}

#[tokio::test]
async fn test_history_endpoint_gateway_refused() {
    let url = refused_url().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/messages").add_query_param("sessionKey", "s1").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"], "Gateway Unreachable");
    assert_eq!(body["gatewayUrl"], url);
    assert!(body["details"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_history_endpoint_html_is_unavailable() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/messages").add_query_param("sessionKey", "html").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert!(body["details"].as_str().unwrap().contains("text/html"));
}

#[tokio::test]
async fn test_send_message_forwards_routing_metadata() {
    let (url, sent) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server
        .post("/api/send-message")
        .json(&json!({ "sessionKey": "s1", "message": "deploy now", "source": "dashboard" }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (key, forwarded) = &sent[0];
    assert_eq!(key, "s1");
    assert_eq!(forwarded["message"], "deploy now");
    assert_eq!(forwarded["metadata"]["tags"], json!(["beast-backoffice"]));
    assert_eq!(forwarded["metadata"]["source"], "dashboard");
}

#[tokio::test]
async fn test_send_message_requires_fields() {
    let (url, sent) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    for payload in [json!({ "message": "hi" }), json!({ "sessionKey": "s1" }), json!({ "sessionKey": "", "message": "hi" })] {
        let response = server.post("/api/send-message").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "sessionKey and message are required");
    }

    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_message_downstream_failure() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server
        .post("/api/send-message")
        .json(&json!({ "sessionKey": "broken", "message": "hello?" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to send message");
    assert_eq!(body["details"], "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn test_sessions_endpoint() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/sessions").await;
    response.assert_status(StatusCode::OK);
    let sessions: Vec<Value> = response.json();
    assert_eq!(sessions[0]["sessionKey"], "s1");

    let response = server
        .post("/api/sessions")
        .json(&json!({ "action": "history", "sessionKey": "s1" }))
        .await;
    response.assert_status(StatusCode::OK);
    let history: Vec<Value> = response.json();
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["id"], "m1");
    assert_eq!(history[1]["metadata"]["k"], 1);

    let response = server
        .post("/api/sessions")
        .json(&json!({ "action": "delete", "sessionKey": "s1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid action");
}

#[tokio::test]
async fn test_sessions_endpoint_gateway_refused() {
    let url = refused_url().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/sessions").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"], "Gateway Unreachable");
}

#[tokio::test]
async fn test_status_online_passes_through_upstream() {
    let (url, _) = spawn_gateway().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/status").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["gateway"], "online");
    assert_eq!(body["channels"]["telegram"], true);
    assert_eq!(body["channels"]["webchat"], true);
    assert_eq!(body["version"], "2.4.1");
    assert_eq!(body["memory"], "warm");
    assert!(body["lastHeartbeat"].is_string());
}

#[tokio::test]
async fn test_status_offline_gives_setup_guidance() {
    let url = refused_url().await;
    let server = test_server(settings(&url), Arc::new(MemoryMessageStore::new()));

    let response = server.get("/api/status").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["gateway"], "offline");
    assert_eq!(body["memory"], "disconnected");
    assert_eq!(body["lastHeartbeat"], "never");
    assert_eq!(body["channels"]["telegram"], false);
    assert_eq!(body["error"], "Gateway Unreachable");
    assert_eq!(body["gatewayUrl"], url);
    assert!(body["setup"].as_str().unwrap().contains("OPENCLAW_GATEWAY_URL"));
}
