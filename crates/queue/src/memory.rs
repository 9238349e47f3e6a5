use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, secrecy::Secret};

use crate::{
    error::{Error, Result},
    transport::{QueueTransport, ReceivedEntry},
};

#[derive(Default)]
struct State {
    ready: VecDeque<(String, String)>,
    locked: HashMap<String, (String, String)>,
    next_id: u64,
}

/// Peek-lock queue held in process memory.
#[derive(Default)]
pub struct InMemoryQueue {
    state: Mutex<State>,
    fail_sends: AtomicBool,
    sends: AtomicUsize,
    abandons: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Enqueue a body without going through `send`.
    pub fn push_raw(&self, body: impl Into<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.next_id += 1;
        let id = format!("msg-{}", state.next_id);
        state.ready.push_back((id, body.into()));
    }

    /// Bodies waiting for delivery, head first.
    pub fn pending(&self) -> Vec<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.ready.iter().map(|(_, body)| body.clone()).collect()
    }

    pub fn locked_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .locked
            .len()
    }

    /// Number of `send` calls, successful or not.
    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn abandon_count(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }

    fn take_lock(&self, entry: &ReceivedEntry) -> Result<(String, String)> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .locked
            .remove(&entry.lock_token)
            .ok_or_else(|| Error::Status {
                operation: "settle",
                status: 410,
                body: "MessageLockLost".into(),
            })
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn send(&self, body: String, _credentials: &Secret<String>) -> Result<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Status {
                operation: "send",
                status: 503,
                body: "ServerBusy".into(),
            });
        }
        self.push_raw(body);
        Ok(())
    }

    async fn receive(&self, _credentials: &Secret<String>) -> Result<Option<ReceivedEntry>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some((message_id, body)) = state.ready.pop_front() else {
            return Ok(None);
        };
        state.next_id += 1;
        let lock_token = format!("lock-{}", state.next_id);
        state
            .locked
            .insert(lock_token.clone(), (message_id.clone(), body.clone()));
        Ok(Some(ReceivedEntry {
            body,
            message_id,
            lock_token,
        }))
    }

    async fn complete(&self, entry: &ReceivedEntry, _credentials: &Secret<String>) -> Result<()> {
        self.take_lock(entry).map(|_| ())
    }

    async fn abandon(&self, entry: &ReceivedEntry, _credentials: &Secret<String>) -> Result<()> {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        let released = self.take_lock(entry)?;
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .ready
            .push_front(released);
        Ok(())
    }
}
