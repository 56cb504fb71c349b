use serde::{Deserialize, Serialize};
use validator::Validate;

pub const BACKOFFICE_TAG: &str = "beast-backoffice";
pub const DEFAULT_SOURCE: &str = "backoffice";

pub const SETUP_GUIDANCE: &str = "Failed to connect to the agent gateway. Make sure the gateway is running \
     and OPENCLAW_GATEWAY_URL points at it. When the dashboard is hosted remotely, expose the local \
     gateway through a tunnel and set OPENCLAW_GATEWAY_URL to the tunnel address.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayHistoryQuery {
    pub session_key: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "sessionKey is required"))]
    pub session_key: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    pub action: Option<String>,
    pub session_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Channels {
    pub telegram: bool,
    pub webchat: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedStatusResponse {
    pub gateway: &'static str,
    pub channels: Channels,
    pub memory: &'static str,
    pub last_heartbeat: &'static str,
    pub error: String,
    pub details: String,
    pub gateway_url: String,
    pub timestamp: String,
    pub setup: &'static str,
}
