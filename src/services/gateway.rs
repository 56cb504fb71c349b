use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

pub const UNREACHABLE: &str = "Gateway Unreachable";

#[derive(Error, Debug)]
pub enum GatewayFailure {
    #[error("request timed out after {0}ms")]
    Timeout(u128),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("Gateway returned {0} instead of JSON")]
    ContentType(String),
}

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[error("{error}: {details}")]
pub struct GatewayError {
    pub error: String,
    pub details: String,
    pub gateway_url: String,
    pub timestamp: String,
}

impl GatewayError {
    pub fn unreachable(gateway_url: &str, failure: &GatewayFailure) -> Self {
        Self {
            error: UNREACHABLE.to_string(),
            details: failure.to_string(),
            gateway_url: gateway_url.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_key: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub last_activity: String,
    #[serde(default)]
    pub message_count: u64,
}

// Upstream entries are loosely shaped; `timestamp` is epoch millis, sometimes a float.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Value>,
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    gateway_url: String,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            gateway_url: base_url.to_string(),
            timeout,
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, GatewayError> {
        let url = format!("{}/api/sessions", self.base_url);
        self.get_json(&url).await.map_err(|e| self.normalize("fetching sessions", e))
    }

    pub async fn get_history(&self, session_key: &str) -> Result<Vec<GatewayMessage>, GatewayError> {
        self.fetch_history(session_key).await
    }

    // Same request, upstream entries passed through untouched.
    pub async fn get_history_raw(&self, session_key: &str) -> Result<Value, GatewayError> {
        self.fetch_history(session_key).await
    }

    async fn fetch_history<T: DeserializeOwned>(&self, session_key: &str) -> Result<T, GatewayError> {
        let url = format!("{}/api/sessions/{}/history", self.base_url, session_key);
        debug!("Fetching session history from: {}", url);
        self.get_json(&url).await.map_err(|e| self.normalize("fetching history", e))
    }

    pub async fn send_message(
        &self,
        session_key: &str,
        content: &str,
        metadata: Option<&Value>,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/api/sessions/{}/send", self.base_url, session_key);
        let body = SendRequest {
            message: content,
            metadata,
        };

        let result = self
            .bounded(async {
                let response = self.client.post(&url).json(&body).send().await?;
                check_status(response).map(|_| ())
            })
            .await;

        result.map_err(|e| self.normalize("sending message", e))
    }

    pub async fn get_status(&self) -> Result<Map<String, Value>, GatewayError> {
        let url = format!("{}/api/status", self.base_url);
        self.get_json(&url).await.map_err(|e| self.normalize("fetching status", e))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayFailure> {
        self.bounded(async {
            let response = self
                .client
                .get(url)
                .header("Content-Type", "application/json")
                .send()
                .await?;
            let response = check_status(response)?;
            expect_json(&response)?;
            Ok::<T, GatewayFailure>(response.json::<T>().await?)
        })
        .await
    }

    // Bounds the whole exchange, body included. Dropping the future cancels the request.
    async fn bounded<T, F>(&self, request: F) -> Result<T, GatewayFailure>
    where
        F: Future<Output = Result<T, GatewayFailure>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(GatewayFailure::Timeout(self.timeout.as_millis())),
        }
    }

    fn normalize(&self, action: &str, failure: GatewayFailure) -> GatewayError {
        error!("Error {}: {}", action, failure);
        GatewayError::unreachable(&self.gateway_url, &failure)
    }
}

fn check_status(response: Response) -> Result<Response, GatewayFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(GatewayFailure::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

fn expect_json(response: &Response) -> Result<(), GatewayFailure> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match content_type {
        Some(ct) if ct.contains("application/json") => Ok(()),
        Some(ct) => Err(GatewayFailure::ContentType(ct)),
        None => Err(GatewayFailure::ContentType("unknown content type".to_string())),
    }
}
