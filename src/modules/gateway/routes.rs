use axum::{
    routing::{get, post},
    Router,
};

use crate::modules::gateway::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(controller::history))
        .route("/api/send-message", post(controller::send_message))
        .route(
            "/api/sessions",
            get(controller::list_sessions).post(controller::session_action),
        )
        .route("/api/status", get(controller::status))
}
