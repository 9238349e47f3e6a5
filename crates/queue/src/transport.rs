use {async_trait::async_trait, secrecy::Secret};

use crate::error::Result;

/// An entry held under a peek-lock, awaiting settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedEntry {
    pub body: String,
    pub message_id: String,
    pub lock_token: String,
}

/// Queue transport. `credentials` is the connection string, resolved by the
/// caller for every operation.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send(&self, body: String, credentials: &Secret<String>) -> Result<()>;

    /// Lock the head entry. `Ok(None)` means the queue is empty.
    async fn receive(&self, credentials: &Secret<String>) -> Result<Option<ReceivedEntry>>;

    /// Acknowledge and remove a locked entry.
    async fn complete(&self, entry: &ReceivedEntry, credentials: &Secret<String>) -> Result<()>;

    /// Release the lock so the entry is redelivered.
    async fn abandon(&self, entry: &ReceivedEntry, credentials: &Secret<String>) -> Result<()>;
}
