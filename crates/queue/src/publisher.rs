use std::sync::Arc;

use {
    courier_common::NormalizedMessage,
    courier_config::QueueConfig,
    courier_vault::SecretResolver,
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    transport::QueueTransport,
};

/// Result of a best-effort publish. Never an error: the relay answers the
/// webhook the same way either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Failed { reason: String },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Result of one peek-lock receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueOutcome {
    /// Decoded and completed.
    Received(NormalizedMessage),
    /// Nothing waiting.
    Empty,
    /// The body did not decode; the entry was abandoned, not dropped.
    Poisoned { message_id: String, reason: String },
    /// Credentials or transport failed before a decision was made.
    Failed { reason: String },
}

/// Publishes [`NormalizedMessage`]s to the work queue and consumes them back.
pub struct QueuePublisher {
    secrets: Arc<dyn SecretResolver>,
    transport: Arc<dyn QueueTransport>,
    connection_secret: String,
}

impl QueuePublisher {
    pub fn new(
        secrets: Arc<dyn SecretResolver>,
        transport: Arc<dyn QueueTransport>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            secrets,
            transport,
            connection_secret: config.connection_string_secret.clone(),
        }
    }

    /// Send `message` once. Failures are logged and reported, never raised.
    pub async fn publish(&self, message: &NormalizedMessage) -> PublishOutcome {
        match self.try_publish(message).await {
            Ok(()) => {
                info!(is_file = message.is_file, "published message");
                PublishOutcome::Published
            },
            Err(e) => {
                warn!(error = %e, "publish failed, message dropped");
                PublishOutcome::Failed {
                    reason: e.to_string(),
                }
            },
        }
    }

    async fn try_publish(&self, message: &NormalizedMessage) -> Result<()> {
        let body = message
            .to_json()
            .map_err(|e| Error::external("encode message", e))?;
        let credentials = self.secrets.resolve(&self.connection_secret).await?;
        self.transport.send(body, &credentials).await
    }

    /// Lock the head entry and settle it: complete when it decodes, abandon
    /// when it does not.
    pub async fn receive_one(&self) -> DequeueOutcome {
        let credentials = match self.secrets.resolve(&self.connection_secret).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "queue credentials unavailable");
                return DequeueOutcome::Failed {
                    reason: e.to_string(),
                };
            },
        };

        let entry = match self.transport.receive(&credentials).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return DequeueOutcome::Empty,
            Err(e) => {
                warn!(error = %e, "queue receive failed");
                return DequeueOutcome::Failed {
                    reason: e.to_string(),
                };
            },
        };

        match NormalizedMessage::from_json(&entry.body) {
            Ok(message) => {
                // A failed completion means the entry comes back later; the
                // consumer already has it, so report it as received.
                if let Err(e) = self.transport.complete(&entry, &credentials).await {
                    warn!(message_id = %entry.message_id, error = %e, "complete failed, entry will be redelivered");
                }
                DequeueOutcome::Received(message)
            },
            Err(e) => {
                warn!(message_id = %entry.message_id, error = %e, "poison entry, releasing lock");
                if let Err(abandon_err) = self.transport.abandon(&entry, &credentials).await {
                    warn!(message_id = %entry.message_id, error = %abandon_err, "abandon failed, lock will expire");
                }
                DequeueOutcome::Poisoned {
                    message_id: entry.message_id,
                    reason: e.to_string(),
                }
            },
        }
    }

    /// The next decodable message, if any.
    pub async fn dequeue(&self) -> Option<NormalizedMessage> {
        match self.receive_one().await {
            DequeueOutcome::Received(message) => Some(message),
            _ => None,
        }
    }
}
