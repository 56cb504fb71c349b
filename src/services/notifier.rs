use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::modules::comms::model::truncate_chars;

pub const WAKE_TEXT_CHARS: usize = 2000;
pub const WAKE_SOURCE: &str = "backoffice";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("wake push timed out after {0}ms")]
    Timeout(u128),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WakeMetadata<'a> {
    source: &'a str,
    session_key: &'a str,
    supabase_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WakeRequest<'a> {
    text: String,
    mode: &'a str,
    metadata: WakeMetadata<'a>,
}

#[derive(Clone)]
pub struct WakeNotifier {
    client: Client,
    endpoint: String,
    password: String,
    timeout: Duration,
}

impl WakeNotifier {
    pub fn new(base_url: &str, password: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/hooks/wake", base_url.trim_end_matches('/')),
            password: password.to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Option<Self> {
        match (settings.wake_url.as_deref(), settings.wake_password.as_deref()) {
            (Some(url), Some(password)) => Some(Self::new(url, password, settings.gateway_timeout)),
            _ => None,
        }
    }

    pub async fn wake(&self, message: &str, session_key: &str, store_id: Option<&str>) -> Result<bool, NotifyError> {
        let body = WakeRequest {
            text: format!("[backoffice] {}", truncate_chars(message, WAKE_TEXT_CHARS)),
            mode: "now",
            metadata: WakeMetadata {
                source: WAKE_SOURCE,
                session_key,
                supabase_id: store_id,
            },
        };

        info!("Sending wake push to: {}", self.endpoint);

        let request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.password))
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout.as_millis()))??;

        info!("Wake push response: {}", response.status());
        Ok(response.status().is_success())
    }

    // Spawned so the push outlives a dropped request.
    pub fn dispatch(&self, message: String, session_key: String, store_id: Option<String>) -> tokio::task::JoinHandle<bool> {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.wake(&message, &session_key, store_id.as_deref()).await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Wake push error (non-fatal): {}", e);
                    false
                }
            }
        })
    }
}
