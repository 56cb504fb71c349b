use std::sync::Arc;

use anyhow::Context;
use backoffice::config::{database, settings::Settings};
use backoffice::modules::comms::crud::{MemoryMessageStore, MessageStore, MongoMessageStore};
use backoffice::{app, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("backoffice=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;

    let store: Arc<dyn MessageStore> = match database::connect_optional(&settings)
        .await
        .context("failed to connect to MongoDB")?
    {
        Some(db) => Arc::new(MongoMessageStore::new(&db)),
        None => {
            warn!("MONGODB_URI not set, messages are kept in memory only");
            Arc::new(MemoryMessageStore::new())
        }
    };

    if settings.uses_default_webhook_secret() {
        warn!("BACKOFFICE_WEBHOOK_SECRET not set, using the default secret");
    }
    if settings.wake_url.is_none() || settings.wake_password.is_none() {
        info!("Wake webhook not configured, relayed messages will not notify the agent");
    }

    let addr = settings.bind_addr();
    info!("Agent gateway at {} (timeout {:?})", settings.gateway_url, settings.gateway_timeout);

    let state = AppState::new(settings, store);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Back office listening on {}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
