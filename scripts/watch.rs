//! Follow a conversation from the terminal.
//!
//! Run with: cargo run --bin watch -- [dashboard-url]
//! Lines typed on stdin are relayed as operator messages.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use backoffice::client::reconciler::HistoryReconciler;
use backoffice::client::session_key;
use backoffice::client::source::DashboardClient;
use backoffice::modules::comms::model::Sender;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("BACKOFFICE_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
    let key_file = env::var("BACKOFFICE_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".backoffice-session"));

    let session_key = session_key::load_or_create(&key_file)?;
    println!("Watching session {} on {}", session_key, base_url);

    let client = DashboardClient::new(&base_url, Duration::from_secs(10))?;
    let reconciler = HistoryReconciler::new(client.clone());
    let handle = reconciler.start(session_key.clone());
    let mut updates = handle.updates();
    let mut printed = 0usize;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = handle.messages();
                for message in messages.iter().skip(printed) {
                    let who = match message.sender {
                        Sender::User => "you",
                        Sender::Ai => "agent",
                    };
                    println!("[{}] {}: {}", message.timestamp, who, message.content);
                }
                printed = messages.len();
            }
            line = stdin.next_line() => {
                match line? {
                    Some(text) if !text.trim().is_empty() => {
                        if let Err(e) = client.relay(&session_key, &text).await {
                            println!("✗ Failed to send: {}", e);
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}
