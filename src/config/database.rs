use mongodb::{Client, Database};

use crate::config::settings::Settings;

pub async fn connect(uri: &str, db_name: &str) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(db_name))
}

pub async fn connect_optional(settings: &Settings) -> Result<Option<Database>, mongodb::error::Error> {
    match settings.mongodb_uri.as_deref() {
        Some(uri) => connect(uri, &settings.mongodb_database).await.map(Some),
        None => Ok(None),
    }
}
