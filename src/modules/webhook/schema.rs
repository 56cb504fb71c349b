use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::modules::comms::model::Message;

pub const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "sessionKey is required"))]
    pub session_key: String,
    pub metadata: Option<Value>,
    pub sender: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyAck {
    pub success: bool,
    pub received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferQuery {
    pub session_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BufferResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}
