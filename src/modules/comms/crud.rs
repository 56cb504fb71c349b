use std::sync::Mutex;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};
use thiserror::Error;

use crate::modules::comms::model::StoredMessage;

const COLLECTION_NAME: &str = "messages";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: StoredMessage) -> Result<ObjectId, StoreError>;

    // Most recent `limit` messages, oldest first.
    async fn recent(&self, session_key: &str, limit: i64) -> Result<Vec<StoredMessage>, StoreError>;
}

pub struct MongoMessageStore {
    collection: Collection<StoredMessage>,
}

impl MongoMessageStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION_NAME),
        }
    }
}

#[async_trait]
impl MessageStore for MongoMessageStore {
    async fn insert(&self, message: StoredMessage) -> Result<ObjectId, StoreError> {
        let id = message.id;
        self.collection.insert_one(message).await?;
        Ok(id)
    }

    async fn recent(&self, session_key: &str, limit: i64) -> Result<Vec<StoredMessage>, StoreError> {
        use futures::TryStreamExt;

        let cursor = self
            .collection
            .find(doc! { "session_key": session_key })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(limit)
            .await?;

        let mut rows: Vec<StoredMessage> = cursor.try_collect().await?;
        rows.reverse();
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryMessageStore {
    rows: Mutex<Vec<StoredMessage>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: StoredMessage) -> Result<ObjectId, StoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        let id = message.id;
        rows.push(message);
        Ok(id)
    }

    async fn recent(&self, session_key: &str, limit: i64) -> Result<Vec<StoredMessage>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        // Rows are pushed in creation order already.
        let matching: Vec<&StoredMessage> = rows.iter().filter(|m| m.session_key == session_key).collect();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let skip = matching.len().saturating_sub(limit);

        Ok(matching.into_iter().skip(skip).cloned().collect())
    }
}
