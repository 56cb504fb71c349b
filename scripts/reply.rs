//! Post an agent reply straight into the message store.
//!
//! Run with: cargo run --bin reply -- "Your reply" [sender] [sessionKey]

use std::env;

use backoffice::config::{database, settings::Settings};
use backoffice::modules::comms::crud::{MessageStore, MongoMessageStore};
use backoffice::modules::comms::model::{Sender, StoredMessage, DEFAULT_SESSION_KEY};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(message) = args.first() else {
        println!("Usage: reply 'Your message here'");
        println!("       reply 'Your message' assistant [sessionKey]");
        std::process::exit(1);
    };
    let sender = args.get(1).map(|s| Sender::from_role(s)).unwrap_or(Sender::Ai);
    let session_key = args.get(2).cloned().unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());

    let settings = Settings::from_env()?;
    let Some(uri) = settings.mongodb_uri.as_deref() else {
        println!("✗ MONGODB_URI is not set");
        std::process::exit(1);
    };

    println!("Connecting to MongoDB...");
    let db = database::connect(uri, &settings.mongodb_database).await?;
    let store = MongoMessageStore::new(&db);

    let row = StoredMessage::new(session_key.clone(), sender, message, None);
    let id = store.insert(row).await?;

    println!("✓ Reply posted to session {} ({})", session_key, id.to_hex());
    Ok(())
}
