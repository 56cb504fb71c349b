use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::modules::comms::model::Message;
use crate::modules::comms::schema::DEFAULT_HISTORY_LIMIT;
use crate::modules::webhook::schema::BufferResponse;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("unexpected status {0} from {1}")]
    Status(u16, String),
}

#[async_trait]
pub trait HistorySource: Send + Sync + 'static {
    async fn fetch(&self, session_key: &str) -> Result<Vec<Message>, FetchError>;
}

// Stored history first, then replies still sitting in the webhook buffer.
#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
    limit: i64,
}

impl DashboardClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub async fn relay(&self, session_key: &str, message: &str) -> Result<(), FetchError> {
        let url = format!("{}/api/comms", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "message": message, "sessionKey": session_key }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16(), url));
        }
        Ok(())
    }

    async fn stored(&self, session_key: &str) -> Result<Vec<Message>, FetchError> {
        let url = format!("{}/api/comms", self.base_url);
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("sessionKey", session_key), ("limit", limit.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16(), url));
        }
        Ok(response.json().await?)
    }

    async fn buffered(&self, session_key: &str) -> Result<Vec<Message>, FetchError> {
        let url = format!("{}/api/webhook", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("sessionKey", session_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16(), url));
        }
        let body: BufferResponse = response.json().await?;
        Ok(body.messages)
    }
}

#[async_trait]
impl HistorySource for DashboardClient {
    async fn fetch(&self, session_key: &str) -> Result<Vec<Message>, FetchError> {
        let mut messages = self.stored(session_key).await?;
        messages.extend(self.buffered(session_key).await?);
        Ok(messages)
    }
}
