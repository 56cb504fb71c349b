use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::modules::comms::model::Message;

// Arrival order per session. Also written through to the store.
#[derive(Clone, Default)]
pub struct ReplyBuffer {
    inner: Arc<Mutex<HashMap<String, Vec<Message>>>>,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, session_key: &str, message: Message) {
        self.lock()
            .entry(session_key.to_string())
            .or_default()
            .push(message);
    }

    pub fn snapshot(&self, session_key: &str) -> Vec<Message> {
        self.lock().get(session_key).cloned().unwrap_or_default()
    }

    pub fn len(&self, session_key: &str) -> usize {
        self.lock().get(session_key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, session_key: &str) -> bool {
        self.len(session_key) == 0
    }

    // A panic mid-push leaves at worst a fully appended entry, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
