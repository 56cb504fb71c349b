use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::settings::Settings;
use crate::modules::comms::crud::MessageStore;
use crate::services::gateway::GatewayClient;
use crate::services::notifier::WakeNotifier;
use crate::services::reply_buffer::ReplyBuffer;

pub mod client;
pub mod config;
pub mod modules;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub gateway: GatewayClient,
    pub notifier: Option<WakeNotifier>,
    pub replies: ReplyBuffer,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn MessageStore>) -> Self {
        let gateway = GatewayClient::new(&settings.gateway_url, settings.gateway_timeout);
        let notifier = WakeNotifier::from_settings(&settings);

        Self {
            store,
            gateway,
            notifier,
            replies: ReplyBuffer::new(),
            settings: Arc::new(settings),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(modules::comms::routes::routes())
        .merge(modules::gateway::routes::routes())
        .merge(modules::webhook::routes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
