use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::client::source::HistorySource;
use crate::modules::comms::model::Message;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Stopped,
}

// Appends unseen ids in fetch order; displayed messages are never removed or reordered.
pub fn merge_messages(displayed: &mut Vec<Message>, fetched: Vec<Message>) -> usize {
    let mut seen: HashSet<String> = displayed.iter().map(|m| m.id.clone()).collect();
    let before = displayed.len();

    for message in fetched {
        if seen.insert(message.id.clone()) {
            displayed.push(message);
        }
    }

    displayed.len() - before
}

pub struct HistoryReconciler<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: HistorySource> HistoryReconciler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn start(&self, session_key: impl Into<String>) -> ReconcilerHandle {
        let session_key = session_key.into();
        let displayed = Arc::new(Mutex::new(Vec::new()));
        let (state_tx, state_rx) = watch::channel(PollState::Idle);
        let (updates_tx, updates_rx) = watch::channel(0usize);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            session_key.clone(),
            self.interval,
            Arc::clone(&displayed),
            state_tx,
            updates_tx,
            stop_rx,
        ));

        ReconcilerHandle {
            session_key,
            displayed,
            state: state_rx,
            updates: updates_rx,
            stop: stop_tx,
            task: Some(task),
        }
    }

    pub async fn switch_session(&self, current: ReconcilerHandle, session_key: impl Into<String>) -> ReconcilerHandle {
        current.stop().await;
        self.start(session_key)
    }
}

pub struct ReconcilerHandle {
    session_key: String,
    displayed: Arc<Mutex<Vec<Message>>>,
    state: watch::Receiver<PollState>,
    updates: watch::Receiver<usize>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.displayed).clone()
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    pub fn updates(&self) -> watch::Receiver<usize> {
        self.updates.clone()
    }

    pub async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

async fn poll_loop<S: HistorySource>(
    source: Arc<S>,
    session_key: String,
    interval: Duration,
    displayed: Arc<Mutex<Vec<Message>>>,
    state: watch::Sender<PollState>,
    updates: watch::Sender<usize>,
    mut stop: watch::Receiver<bool>,
) {
    // One fetch at a time; ticks missed while fetching are skipped.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }

        state.send_replace(PollState::Fetching);
        let fetched = tokio::select! {
            _ = stop.changed() => break,
            result = source.fetch(&session_key) => result,
        };

        match fetched {
            Ok(batch) => {
                let shown = {
                    let mut list = lock(&displayed);
                    let added = merge_messages(&mut list, batch);
                    (added > 0).then_some(list.len())
                };
                if let Some(total) = shown {
                    updates.send_replace(total);
                }
            }
            Err(e) => debug!("Poll for session {} failed: {}", session_key, e),
        }

        state.send_replace(PollState::Idle);
    }

    state.send_replace(PollState::Stopped);
}

fn lock(displayed: &Mutex<Vec<Message>>) -> MutexGuard<'_, Vec<Message>> {
    displayed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
