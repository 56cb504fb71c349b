#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use backoffice::config::settings::Settings;
use backoffice::modules::comms::crud::{MemoryMessageStore, MessageStore, StoreError};
use backoffice::modules::comms::model::StoredMessage;
use backoffice::{app, AppState};
use bson::oid::ObjectId;
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "test-webhook-secret";

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on, so connections are refused.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn settings(gateway_url: &str) -> Settings {
    Settings {
        gateway_url: gateway_url.to_string(),
        gateway_timeout: Duration::from_millis(1000),
        webhook_secret: TEST_SECRET.to_string(),
        ..Settings::default()
    }
}

pub fn test_server(settings: Settings, store: Arc<dyn MessageStore>) -> TestServer {
    TestServer::new(app(AppState::new(settings, store))).unwrap()
}

pub async fn setup_test_server() -> TestServer {
    let gateway = refused_url().await;
    test_server(settings(&gateway), Arc::new(MemoryMessageStore::new()))
}

/// Store whose every call fails, for exercising the non-fatal paths.
pub struct FailingStore;

#[async_trait]
impl MessageStore for FailingStore {
    async fn insert(&self, _message: StoredMessage) -> Result<ObjectId, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn recent(&self, _session_key: &str, _limit: i64) -> Result<Vec<StoredMessage>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}
